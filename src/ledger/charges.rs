use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ChargeableKind;

/// Kind-agnostic view of one chargeable record, as the aggregator needs it.
/// `total_amount` is `None` when the record never had its total finalized;
/// such records contribute zero rather than failing the whole computation.
#[derive(Debug, Clone)]
pub struct ChargeSummary {
    pub kind: ChargeableKind,
    pub id: Uuid,
    pub total_amount: Option<Decimal>,
    pub cancelled: bool,
}

/// Gross obligation: the sum of totals over all non-cancelled chargeables,
/// across every kind. A kind with no records contributes zero.
pub fn gross_total(charges: &[ChargeSummary]) -> Decimal {
    let mut total = Decimal::ZERO;
    for charge in charges {
        if charge.cancelled {
            continue;
        }
        match charge.total_amount {
            Some(amount) => total += amount,
            None => {
                tracing::warn!(
                    kind = charge.kind.as_str(),
                    id = %charge.id,
                    "chargeable has no finalized total, counting as zero"
                );
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(total: Option<&str>, cancelled: bool) -> ChargeSummary {
        ChargeSummary {
            kind: ChargeableKind::ServiceBooking,
            id: Uuid::new_v4(),
            total_amount: total.map(|t| t.parse().unwrap()),
            cancelled,
        }
    }

    #[test]
    fn sums_non_cancelled_totals() {
        let charges = vec![
            charge(Some("1200.00"), false),
            charge(Some("500.00"), false),
            charge(Some("800.00"), true),
        ];
        assert_eq!(gross_total(&charges), "1700.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(gross_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn missing_total_contributes_zero() {
        let charges = vec![charge(None, false), charge(Some("300.00"), false)];
        assert_eq!(gross_total(&charges), "300.00".parse::<Decimal>().unwrap());
    }
}
