use rust_decimal::Decimal;
use serde::Serialize;

use super::classify::PaymentBuckets;

/// Derived financial view for one user. Never persisted; recomputed per
/// request. Every surface that shows "what the user still owes" must show
/// `net_unpaid` from this struct — there is no second place it is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub gross_total: Decimal,
    pub paid_amount: Decimal,
    /// Authoritative outstanding figure: `gross_total - paid_amount`.
    pub net_unpaid: Decimal,
    /// Owed right now, excluding cash commitments and proofs in verification.
    pub actionable_unpaid: Decimal,
    pub cash_committed: Decimal,
    pub online_pending: Decimal,
    /// Informational rollup: cash received plus cash committed.
    pub cash_total: Decimal,
    pub refunded_total: Decimal,
}

impl Balance {
    pub fn compose(gross_total: Decimal, buckets: &PaymentBuckets) -> Self {
        let paid_amount = buckets.paid_total();
        Self {
            gross_total,
            paid_amount,
            net_unpaid: gross_total - paid_amount,
            actionable_unpaid: buckets.actionable_unpaid_total(),
            cash_committed: buckets.cash_committed_total(),
            online_pending: buckets.online_pending_total(),
            cash_total: buckets.cash_total(),
            refunded_total: buckets.refunded_total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChargeableKind, ChargeableRef, Payment, PaymentMethod, PaymentStatus};
    use uuid::Uuid;

    fn payment(amount: &str, status: PaymentStatus, method: Option<PaymentMethod>) -> Payment {
        let mut p = Payment::new(
            Uuid::new_v4(),
            ChargeableRef {
                kind: ChargeableKind::ServiceBooking,
                id: Uuid::new_v4(),
            },
            amount.parse().unwrap(),
            method,
        );
        p.status = status;
        p
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn fully_paid_booking_nets_to_zero() {
        // One confirmed booking of 1200.00, its payment marked paid.
        let buckets = PaymentBuckets::classify(
            vec![payment("1200.00", PaymentStatus::Paid, Some(PaymentMethod::Online))],
            |_| false,
        );
        let balance = Balance::compose(dec("1200.00"), &buckets);
        assert_eq!(balance.gross_total, dec("1200.00"));
        assert_eq!(balance.paid_amount, dec("1200.00"));
        assert_eq!(balance.net_unpaid, dec("0.00"));
    }

    #[test]
    fn cash_commitment_is_owed_but_not_actionable() {
        // Pending pharmacy order of 500.00 with an unpaid cash payment.
        let buckets = PaymentBuckets::classify(
            vec![payment("500.00", PaymentStatus::Unpaid, Some(PaymentMethod::Cash))],
            |_| false,
        );
        let balance = Balance::compose(dec("500.00"), &buckets);
        assert_eq!(balance.paid_amount, dec("0.00"));
        assert_eq!(balance.net_unpaid, dec("500.00"));
        assert_eq!(balance.actionable_unpaid, dec("0.00"));
        assert_eq!(balance.cash_total, dec("500.00"));
    }

    #[test]
    fn net_unpaid_is_gross_minus_paid_exactly() {
        let buckets = PaymentBuckets::classify(
            vec![
                payment("300.00", PaymentStatus::Paid, Some(PaymentMethod::Online)),
                payment("199.99", PaymentStatus::Unpaid, None),
            ],
            |_| false,
        );
        let balance = Balance::compose(dec("499.99"), &buckets);
        assert_eq!(balance.net_unpaid, dec("199.99"));
        assert_eq!(
            balance.net_unpaid,
            balance.gross_total - balance.paid_amount
        );
    }

    #[test]
    fn refunds_do_not_move_net_unpaid() {
        // A refunded payment was never in paid_amount, so net_unpaid only
        // changes through the gross side (its chargeable being cancelled).
        let buckets = PaymentBuckets::classify(
            vec![payment("800.00", PaymentStatus::Refunded, Some(PaymentMethod::Online))],
            |_| false,
        );
        let balance = Balance::compose(dec("0.00"), &buckets);
        assert_eq!(balance.net_unpaid, dec("0.00"));
        assert_eq!(balance.refunded_total, dec("800.00"));
    }
}
