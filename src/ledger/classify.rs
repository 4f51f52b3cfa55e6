use rust_decimal::Decimal;

use crate::domain::{Payment, PaymentMethod, PaymentStatus};

/// A user's payments partitioned by what, if anything, can be done with
/// them. The buckets carry the full records because the listing endpoints
/// render them; the totals are derived on demand.
#[derive(Debug, Default)]
pub struct PaymentBuckets {
    pub paid: Vec<Payment>,
    pub refunded: Vec<Payment>,
    /// Unpaid, cash-after-service: a commitment, not currently payable.
    pub cash_committed: Vec<Payment>,
    /// Online with proof submitted, awaiting staff verification.
    pub online_pending: Vec<Payment>,
    /// Everything still owed that the user can act on right now.
    pub actionable_unpaid: Vec<Payment>,
}

impl PaymentBuckets {
    /// Partition `payments`, dropping entries whose linked chargeable was
    /// cancelled (`is_voided`) — those are stale and belong to no bucket.
    ///
    /// Rules, in precedence order per payment:
    ///   1. paid            -> paid
    ///   2. refunded        -> refunded
    ///   3. unpaid + cash   -> cash_committed
    ///   4. pending, or unpaid + online with proof -> online_pending
    ///   5. otherwise (unpaid, partial)            -> actionable_unpaid
    ///
    /// A `pending` payment is by construction an online payment whose proof
    /// was submitted (that is the only transition into `pending`), so it
    /// sits in the verification queue, not the actionable pile.
    pub fn classify<F>(payments: Vec<Payment>, is_voided: F) -> Self
    where
        F: Fn(&Payment) -> bool,
    {
        let mut buckets = PaymentBuckets::default();

        for payment in payments {
            if is_voided(&payment) {
                continue;
            }

            match payment.status {
                PaymentStatus::Paid => buckets.paid.push(payment),
                PaymentStatus::Refunded => buckets.refunded.push(payment),
                PaymentStatus::Unpaid if payment.method == Some(PaymentMethod::Cash) => {
                    buckets.cash_committed.push(payment)
                }
                PaymentStatus::Pending => buckets.online_pending.push(payment),
                PaymentStatus::Unpaid
                    if payment.method == Some(PaymentMethod::Online) && payment.has_proof() =>
                {
                    buckets.online_pending.push(payment)
                }
                PaymentStatus::Unpaid | PaymentStatus::Partial => {
                    buckets.actionable_unpaid.push(payment)
                }
            }
        }

        buckets
    }

    pub fn paid_total(&self) -> Decimal {
        sum(&self.paid)
    }

    pub fn refunded_total(&self) -> Decimal {
        sum(&self.refunded)
    }

    pub fn cash_committed_total(&self) -> Decimal {
        sum(&self.cash_committed)
    }

    pub fn online_pending_total(&self) -> Decimal {
        sum(&self.online_pending)
    }

    pub fn actionable_unpaid_total(&self) -> Decimal {
        sum(&self.actionable_unpaid)
    }

    /// Cash already received plus cash still committed.
    pub fn cash_total(&self) -> Decimal {
        self.cash_committed_total()
            + self
                .paid
                .iter()
                .filter(|p| p.method == Some(PaymentMethod::Cash))
                .map(|p| p.amount)
                .sum::<Decimal>()
    }
}

fn sum(payments: &[Payment]) -> Decimal {
    payments.iter().map(|p| p.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChargeableKind, ChargeableRef};
    use uuid::Uuid;

    fn payment(amount: &str, status: PaymentStatus, method: Option<PaymentMethod>) -> Payment {
        let user = Uuid::new_v4();
        let mut p = Payment::new(
            user,
            ChargeableRef {
                kind: ChargeableKind::PharmacyOrder,
                id: Uuid::new_v4(),
            },
            amount.parse().unwrap(),
            method,
        );
        p.status = status;
        p
    }

    #[test]
    fn cash_unpaid_is_a_commitment() {
        let buckets = PaymentBuckets::classify(
            vec![payment("500.00", PaymentStatus::Unpaid, Some(PaymentMethod::Cash))],
            |_| false,
        );
        assert_eq!(buckets.cash_committed.len(), 1);
        assert_eq!(buckets.actionable_unpaid_total(), Decimal::ZERO);
        assert_eq!(buckets.cash_total(), "500.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn online_with_proof_awaits_verification() {
        let mut with_proof = payment("300.00", PaymentStatus::Unpaid, Some(PaymentMethod::Online));
        with_proof.transaction_id = Some("TXN-1001".to_string());
        let without_proof = payment("200.00", PaymentStatus::Unpaid, Some(PaymentMethod::Online));

        let buckets = PaymentBuckets::classify(vec![with_proof, without_proof], |_| false);
        assert_eq!(buckets.online_pending_total(), "300.00".parse::<Decimal>().unwrap());
        assert_eq!(buckets.actionable_unpaid_total(), "200.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn pending_status_is_never_actionable() {
        let buckets = PaymentBuckets::classify(
            vec![payment("150.00", PaymentStatus::Pending, Some(PaymentMethod::Online))],
            |_| false,
        );
        assert_eq!(buckets.online_pending.len(), 1);
        assert!(buckets.actionable_unpaid.is_empty());
    }

    #[test]
    fn method_less_unpaid_is_actionable() {
        let buckets =
            PaymentBuckets::classify(vec![payment("100.00", PaymentStatus::Unpaid, None)], |_| false);
        assert_eq!(buckets.actionable_unpaid.len(), 1);
    }

    #[test]
    fn voided_payments_land_in_no_bucket() {
        let paid = payment("400.00", PaymentStatus::Paid, Some(PaymentMethod::Online));
        let voided_id = paid.chargeable.unwrap().id;
        let buckets = PaymentBuckets::classify(vec![paid], move |p| {
            p.chargeable.map(|c| c.id) == Some(voided_id)
        });
        assert!(buckets.paid.is_empty());
        assert_eq!(buckets.paid_total(), Decimal::ZERO);
    }

    #[test]
    fn paid_and_refunded_precede_method_rules() {
        let buckets = PaymentBuckets::classify(
            vec![
                payment("50.00", PaymentStatus::Paid, Some(PaymentMethod::Cash)),
                payment("60.00", PaymentStatus::Refunded, Some(PaymentMethod::Cash)),
            ],
            |_| false,
        );
        assert_eq!(buckets.paid.len(), 1);
        assert_eq!(buckets.refunded.len(), 1);
        assert!(buckets.cash_committed.is_empty());
    }
}
