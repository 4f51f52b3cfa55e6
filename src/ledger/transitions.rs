use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Payment, PaymentMethod, PaymentStatus};
use crate::error::{AppError, Result};

/// Requested change to a payment's lifecycle.
#[derive(Debug, Clone)]
pub enum PaymentAction {
    /// Patient submits evidence of an online transfer.
    SubmitProof {
        transaction_id: String,
        proof_url: Option<String>,
    },
    /// Patient confirms they handed over cash after the service was
    /// delivered.
    ConfirmCash,
    StaffApprove { staff_id: Uuid },
    StaffReject { reason: String },
    /// Side-effect of the linked chargeable being cancelled.
    Refund,
}

/// What the state machine needs to know about the linked chargeable.
/// `None` for unlinked ledger entries (legacy rows), which carry no
/// delivery gate.
#[derive(Debug, Clone, Copy)]
pub struct ChargeableState {
    pub cancelled: bool,
    /// Delivered/completed/returned — the point after which cash can be
    /// confirmed by the patient.
    pub settled: bool,
}

/// Apply `action` to `payment` in place. Guards reject illegal transitions
/// with a validation error and leave the payment untouched; the caller
/// persists only on success.
pub fn apply(
    payment: &mut Payment,
    action: PaymentAction,
    chargeable: Option<ChargeableState>,
    now: DateTime<Utc>,
) -> Result<()> {
    match action {
        PaymentAction::SubmitProof {
            transaction_id,
            proof_url,
        } => submit_proof(payment, transaction_id, proof_url, now),
        PaymentAction::ConfirmCash => confirm_cash(payment, chargeable, now),
        PaymentAction::StaffApprove { staff_id } => staff_approve(payment, staff_id, now),
        PaymentAction::StaffReject { reason } => staff_reject(payment, reason, now),
        PaymentAction::Refund => refund(payment, now),
    }
}

fn submit_proof(
    payment: &mut Payment,
    transaction_id: String,
    proof_url: Option<String>,
    now: DateTime<Utc>,
) -> Result<()> {
    if payment.status != PaymentStatus::Unpaid {
        return Err(AppError::Validation(format!(
            "Proof can only be submitted for an unpaid payment (status is {})",
            payment.status.as_str()
        )));
    }
    if payment.method == Some(PaymentMethod::Cash) {
        return Err(AppError::Validation(
            "Payment method is locked to cash and cannot be changed to online".to_string(),
        ));
    }
    if transaction_id.trim().is_empty() {
        return Err(AppError::Validation(
            "A transaction ID is required to submit payment proof".to_string(),
        ));
    }

    payment.method = Some(PaymentMethod::Online);
    payment.transaction_id = Some(transaction_id);
    if proof_url.is_some() {
        payment.proof_url = proof_url;
    }
    payment.status = PaymentStatus::Pending;
    payment.updated_at = now;
    Ok(())
}

fn confirm_cash(
    payment: &mut Payment,
    chargeable: Option<ChargeableState>,
    now: DateTime<Utc>,
) -> Result<()> {
    if payment.status != PaymentStatus::Unpaid {
        return Err(AppError::Validation(format!(
            "Only an unpaid payment can be confirmed as cash (status is {})",
            payment.status.as_str()
        )));
    }
    if payment.method == Some(PaymentMethod::Online) {
        return Err(AppError::Validation(
            "Payment method is locked to online and cannot be changed to cash".to_string(),
        ));
    }
    // Delivery gate: a linked chargeable must have reached its terminal
    // delivered/completed status before the patient may self-confirm.
    if let Some(state) = chargeable {
        if !state.settled {
            return Err(AppError::Validation(
                "Payment can only be confirmed after the service is delivered".to_string(),
            ));
        }
    }

    payment.method = Some(PaymentMethod::Cash);
    payment.status = PaymentStatus::Paid;
    payment.verified_by = None; // self-confirmed
    payment.verified_at = Some(now);
    payment.paid_at = Some(now);
    payment.updated_at = now;
    Ok(())
}

fn staff_approve(payment: &mut Payment, staff_id: Uuid, now: DateTime<Utc>) -> Result<()> {
    if !matches!(payment.status, PaymentStatus::Unpaid | PaymentStatus::Pending) {
        return Err(AppError::Validation(format!(
            "Payment cannot be approved from status {}",
            payment.status.as_str()
        )));
    }

    payment.status = PaymentStatus::Paid;
    payment.verified_by = Some(staff_id);
    payment.verified_at = Some(now);
    payment.paid_at = Some(now);
    payment.updated_at = now;
    Ok(())
}

fn staff_reject(payment: &mut Payment, reason: String, now: DateTime<Utc>) -> Result<()> {
    if payment.status != PaymentStatus::Pending {
        return Err(AppError::Validation(format!(
            "Only a payment pending verification can be rejected (status is {})",
            payment.status.as_str()
        )));
    }

    // Back to unpaid so the patient can resubmit proof. The submitted
    // evidence stays on the record for audit.
    payment.status = PaymentStatus::Unpaid;
    let note = format!("Proof rejected: {}", reason);
    payment.notes = Some(match payment.notes.take() {
        Some(existing) => format!("{}\n{}", existing, note),
        None => note,
    });
    payment.updated_at = now;
    Ok(())
}

fn refund(payment: &mut Payment, now: DateTime<Utc>) -> Result<()> {
    if matches!(payment.status, PaymentStatus::Paid | PaymentStatus::Refunded) {
        return Err(AppError::Validation(format!(
            "Payment cannot be refunded from status {}",
            payment.status.as_str()
        )));
    }

    payment.status = PaymentStatus::Refunded;
    payment.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChargeableKind, ChargeableRef};
    use rust_decimal::Decimal;

    fn unpaid_payment(method: Option<PaymentMethod>) -> Payment {
        Payment::new(
            Uuid::new_v4(),
            ChargeableRef {
                kind: ChargeableKind::ServiceBooking,
                id: Uuid::new_v4(),
            },
            Decimal::new(120000, 2),
            method,
        )
    }

    fn settled() -> Option<ChargeableState> {
        Some(ChargeableState {
            cancelled: false,
            settled: true,
        })
    }

    fn undelivered() -> Option<ChargeableState> {
        Some(ChargeableState {
            cancelled: false,
            settled: false,
        })
    }

    #[test]
    fn submit_proof_moves_unpaid_to_pending() {
        let mut payment = unpaid_payment(None);
        apply(
            &mut payment,
            PaymentAction::SubmitProof {
                transaction_id: "TXN-42".to_string(),
                proof_url: Some("proofs/42.png".to_string()),
            },
            undelivered(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.method, Some(PaymentMethod::Online));
        assert!(payment.has_proof());
    }

    #[test]
    fn submit_proof_requires_transaction_id() {
        let mut payment = unpaid_payment(None);
        let err = apply(
            &mut payment,
            PaymentAction::SubmitProof {
                transaction_id: "  ".to_string(),
                proof_url: None,
            },
            undelivered(),
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(payment.status, PaymentStatus::Unpaid);
    }

    #[test]
    fn submit_proof_rejected_for_cash_locked_payment() {
        let mut payment = unpaid_payment(Some(PaymentMethod::Cash));
        let err = apply(
            &mut payment,
            PaymentAction::SubmitProof {
                transaction_id: "TXN-1".to_string(),
                proof_url: None,
            },
            undelivered(),
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(payment.method, Some(PaymentMethod::Cash));
    }

    #[test]
    fn cash_confirm_gated_on_delivery() {
        let mut payment = unpaid_payment(Some(PaymentMethod::Cash));
        let err = apply(&mut payment, PaymentAction::ConfirmCash, undelivered(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(payment.status, PaymentStatus::Unpaid);

        apply(&mut payment, PaymentAction::ConfirmCash, settled(), Utc::now()).unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert!(payment.verified_by.is_none());
        assert!(payment.verified_at.is_some());
    }

    #[test]
    fn cash_confirm_locks_method_when_unset() {
        let mut payment = unpaid_payment(None);
        apply(&mut payment, PaymentAction::ConfirmCash, settled(), Utc::now()).unwrap();
        assert_eq!(payment.method, Some(PaymentMethod::Cash));
    }

    #[test]
    fn cash_confirm_rejected_for_online_locked_payment() {
        let mut payment = unpaid_payment(Some(PaymentMethod::Online));
        let err =
            apply(&mut payment, PaymentAction::ConfirmCash, settled(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(payment.method, Some(PaymentMethod::Online));
    }

    #[test]
    fn staff_approve_records_the_actor() {
        let staff = Uuid::new_v4();
        let mut payment = unpaid_payment(Some(PaymentMethod::Online));
        payment.status = PaymentStatus::Pending;

        apply(
            &mut payment,
            PaymentAction::StaffApprove { staff_id: staff },
            undelivered(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.verified_by, Some(staff));
        assert!(payment.paid_at.is_some());
    }

    #[test]
    fn staff_reject_returns_payment_to_unpaid() {
        let mut payment = unpaid_payment(Some(PaymentMethod::Online));
        payment.status = PaymentStatus::Pending;

        apply(
            &mut payment,
            PaymentAction::StaffReject {
                reason: "screenshot unreadable".to_string(),
            },
            undelivered(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(payment.status, PaymentStatus::Unpaid);
        assert!(payment.notes.as_deref().unwrap().contains("unreadable"));
    }

    #[test]
    fn paid_is_terminal() {
        let mut payment = unpaid_payment(Some(PaymentMethod::Cash));
        payment.status = PaymentStatus::Paid;

        for action in [
            PaymentAction::ConfirmCash,
            PaymentAction::Refund,
            PaymentAction::SubmitProof {
                transaction_id: "TXN-9".to_string(),
                proof_url: None,
            },
        ] {
            let err = apply(&mut payment, action, settled(), Utc::now()).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            assert_eq!(payment.status, PaymentStatus::Paid);
        }
    }

    #[test]
    fn refund_covers_unpaid_and_pending() {
        let mut unpaid = unpaid_payment(Some(PaymentMethod::Online));
        apply(&mut unpaid, PaymentAction::Refund, undelivered(), Utc::now()).unwrap();
        assert_eq!(unpaid.status, PaymentStatus::Refunded);

        let mut pending = unpaid_payment(Some(PaymentMethod::Online));
        pending.status = PaymentStatus::Pending;
        apply(&mut pending, PaymentAction::Refund, undelivered(), Utc::now()).unwrap();
        assert_eq!(pending.status, PaymentStatus::Refunded);

        let err = apply(&mut pending, PaymentAction::Refund, undelivered(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
