mod common;

use carelink::{
    domain::*,
    error::AppError,
    ledger::PaymentAction,
    repository::{OrderRepository, PaymentRepository},
};
use common::*;

async fn placed_order(
    ctx: &carelink::service::ServiceContext,
    patient: &User,
    unit_price: &str,
    quantity: i64,
) -> (PharmacyOrder, Payment) {
    let medicine = sample_medicine(ctx, unit_price, 50).await;
    ctx.checkout_service
        .order_medicine(PlaceOrderRequest {
            customer_id: patient.id,
            medicine_id: medicine.id,
            quantity,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn online_proof_then_staff_approval() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "alice", UserRole::Patient).await;
    let staff = create_user(&ctx, "admin", UserRole::Staff).await;
    // 100.00 x 2 + 100.00 delivery = 300.00
    let (_, payment) = placed_order(&ctx, &patient, "100.00", 2).await;

    let before = ctx.balance_service.balance_for(patient.id).await?;

    let pending = ctx
        .payment_service
        .transition(
            payment.id,
            PaymentAction::SubmitProof {
                transaction_id: "TXN-7781".to_string(),
                proof_url: Some("payments/proofs/7781.png".to_string()),
            },
            &patient,
        )
        .await?;
    assert_eq!(pending.status, PaymentStatus::Pending);
    assert_eq!(pending.method, Some(PaymentMethod::Online));

    // While pending, the amount is out of the actionable pile.
    let mid = ctx.balance_service.balance_for(patient.id).await?;
    assert_eq!(mid.online_pending, dec("300.00"));
    assert_eq!(mid.actionable_unpaid, dec("0.00"));

    let paid = ctx
        .payment_service
        .transition(
            payment.id,
            PaymentAction::StaffApprove { staff_id: staff.id },
            &staff,
        )
        .await?;
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(paid.verified_by, Some(staff.id));
    assert!(paid.verified_at.is_some());

    let after = ctx.balance_service.balance_for(patient.id).await?;
    assert_eq!(after.paid_amount, before.paid_amount + dec("300.00"));
    assert_eq!(after.net_unpaid, before.net_unpaid - dec("300.00"));

    Ok(())
}

#[tokio::test]
async fn cash_confirmation_waits_for_delivery() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "bob", UserRole::Patient).await;
    let (order, payment) = placed_order(&ctx, &patient, "150.00", 1).await;

    let err = ctx
        .payment_service
        .transition(payment.id, PaymentAction::ConfirmCash, &patient)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    ctx.order_repo
        .update_order_status(order.id, OrderStatus::Delivered)
        .await?;

    let paid = ctx
        .payment_service
        .transition(payment.id, PaymentAction::ConfirmCash, &patient)
        .await?;
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(paid.method, Some(PaymentMethod::Cash));
    assert!(paid.verified_by.is_none()); // self-confirmed
    assert!(paid.verified_at.is_some());

    Ok(())
}

#[tokio::test]
async fn staff_actions_are_staff_only() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "carol", UserRole::Patient).await;
    let (_, payment) = placed_order(&ctx, &patient, "90.00", 1).await;

    let err = ctx
        .payment_service
        .transition(
            payment.id,
            PaymentAction::StaffApprove {
                staff_id: patient.id,
            },
            &patient,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn payments_are_invisible_to_other_users() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let owner = create_user(&ctx, "dave", UserRole::Patient).await;
    let stranger = create_user(&ctx, "mallory", UserRole::Patient).await;
    let (_, payment) = placed_order(&ctx, &owner, "90.00", 1).await;

    let err = ctx
        .payment_service
        .get(payment.id, &stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn rejected_proof_becomes_actionable_again() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "erin", UserRole::Patient).await;
    let staff = create_user(&ctx, "admin", UserRole::Staff).await;
    let (_, payment) = placed_order(&ctx, &patient, "110.00", 1).await;

    ctx.payment_service
        .transition(
            payment.id,
            PaymentAction::SubmitProof {
                transaction_id: "TXN-1".to_string(),
                proof_url: None,
            },
            &patient,
        )
        .await?;

    let rejected = ctx
        .payment_service
        .transition(
            payment.id,
            PaymentAction::StaffReject {
                reason: "screenshot unreadable".to_string(),
            },
            &staff,
        )
        .await?;
    assert_eq!(rejected.status, PaymentStatus::Unpaid);
    assert!(rejected.notes.as_deref().unwrap().contains("unreadable"));

    // The patient can try again.
    let resubmitted = ctx
        .payment_service
        .transition(
            payment.id,
            PaymentAction::SubmitProof {
                transaction_id: "TXN-2".to_string(),
                proof_url: Some("payments/proofs/retry.png".to_string()),
            },
            &patient,
        )
        .await?;
    assert_eq!(resubmitted.status, PaymentStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn payment_method_is_locked_at_save_time() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "frank", UserRole::Patient).await;
    let (order, payment) = placed_order(&ctx, &patient, "100.00", 1).await;

    ctx.order_repo
        .update_order_status(order.id, OrderStatus::Delivered)
        .await?;
    let paid = ctx
        .payment_service
        .transition(payment.id, PaymentAction::ConfirmCash, &patient)
        .await?;
    assert_eq!(paid.method, Some(PaymentMethod::Cash));

    // A write that flips the method without the override fails and leaves
    // the stored method untouched.
    let mut tampered = paid.clone();
    tampered.method = Some(PaymentMethod::Online);
    let err = ctx
        .payment_repo
        .update(paid.id, tampered.clone(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let stored = ctx.payment_repo.find_by_id(paid.id).await?.unwrap();
    assert_eq!(stored.method, Some(PaymentMethod::Cash));

    // The explicit administrative override is honoured.
    let overridden = ctx.payment_repo.update(paid.id, tampered, true).await?;
    assert_eq!(overridden.method, Some(PaymentMethod::Online));

    Ok(())
}

#[tokio::test]
async fn transitions_on_cancelled_orders_are_rejected() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "grace", UserRole::Patient).await;
    let (order, payment) = placed_order(&ctx, &patient, "100.00", 1).await;

    ctx.checkout_service.cancel_order(order.id, &patient).await?;

    let refunded = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);

    let err = ctx
        .payment_service
        .transition(
            payment.id,
            PaymentAction::SubmitProof {
                transaction_id: "TXN-LATE".to_string(),
                proof_url: None,
            },
            &patient,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}
