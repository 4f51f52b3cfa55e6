mod common;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use carelink::{
    domain::*,
    error::AppError,
    ledger::PaymentAction,
    repository::{CatalogRepository, OrderRepository, PaymentRepository},
};
use common::*;

#[tokio::test]
async fn checkout_creates_order_payment_and_takes_stock() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "alice", UserRole::Patient).await;
    let medicine = sample_medicine(&ctx, "200.00", 10).await;

    let (order, payment) = ctx
        .checkout_service
        .order_medicine(PlaceOrderRequest {
            customer_id: patient.id,
            medicine_id: medicine.id,
            quantity: 3,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;

    // 200 x 3 + 100 delivery
    assert_eq!(order.total_amount, dec("700.00"));
    assert_eq!(payment.amount, order.total_amount);
    assert_eq!(payment.status, PaymentStatus::Unpaid);
    assert_eq!(
        payment.chargeable,
        Some(ChargeableRef {
            kind: ChargeableKind::PharmacyOrder,
            id: order.id,
        })
    );

    let stocked = ctx.catalog_repo.find_medicine(medicine.id).await?.unwrap();
    assert_eq!(stocked.stock_quantity, 7);

    // Exactly one ledger entry per chargeable.
    let linked = ctx
        .payment_repo
        .find_by_chargeable(payment.chargeable.unwrap())
        .await?;
    assert_eq!(linked.len(), 1);

    Ok(())
}

#[tokio::test]
async fn insufficient_stock_rolls_back_everything() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "bob", UserRole::Patient).await;
    let medicine = sample_medicine(&ctx, "200.00", 2).await;

    let err = ctx
        .checkout_service
        .order_medicine(PlaceOrderRequest {
            customer_id: patient.id,
            medicine_id: medicine.id,
            quantity: 5,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Nothing was committed: no order, no payment, stock intact.
    assert!(ctx
        .order_repo
        .list_orders_for_customer(patient.id)
        .await?
        .is_empty());
    assert!(ctx.payment_repo.find_by_user(patient.id).await?.is_empty());
    let stocked = ctx.catalog_repo.find_medicine(medicine.id).await?.unwrap();
    assert_eq!(stocked.stock_quantity, 2);

    Ok(())
}

#[tokio::test]
async fn cancelling_a_confirmed_rental_refunds_and_restores_units() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "carol", UserRole::Patient).await;
    let equipment = sample_equipment(&ctx, 4).await;

    // Two weeks at 350.00 + 100.00 deposit = 800.00
    let (rental, payment) = ctx
        .checkout_service
        .rent_equipment(RentEquipmentRequest {
            customer_id: patient.id,
            equipment_id: equipment.id,
            rental_period: RentalPeriod::Weekly,
            quantity: 1,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;
    assert_eq!(rental.total_amount, dec("800.00"));
    ctx.order_repo
        .update_rental_status(rental.id, RentalStatus::Confirmed)
        .await?;

    let before = ctx.balance_service.balance_for(patient.id).await?;
    assert_eq!(before.gross_total, dec("800.00"));

    let cancelled = ctx
        .checkout_service
        .cancel_rental(rental.id, &patient)
        .await?;
    assert_eq!(cancelled.status, RentalStatus::Cancelled);

    let refunded = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);

    let restored = ctx.catalog_repo.find_equipment(equipment.id).await?.unwrap();
    assert_eq!(restored.available_units, 4);

    // The 800.00 leaves the gross side; the refund itself never touched
    // paid_amount, so net_unpaid simply drops with it.
    let after = ctx.balance_service.balance_for(patient.id).await?;
    assert_eq!(after.gross_total, dec("0.00"));
    assert_eq!(after.paid_amount, before.paid_amount);
    assert_eq!(after.net_unpaid, dec("0.00"));

    Ok(())
}

#[tokio::test]
async fn delivered_orders_cannot_be_cancelled() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "dave", UserRole::Patient).await;
    let medicine = sample_medicine(&ctx, "200.00", 10).await;

    let (order, _) = ctx
        .checkout_service
        .order_medicine(PlaceOrderRequest {
            customer_id: patient.id,
            medicine_id: medicine.id,
            quantity: 1,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;
    ctx.order_repo
        .update_order_status(order.id, OrderStatus::Delivered)
        .await?;

    let err = ctx
        .checkout_service
        .cancel_order(order.id, &patient)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn paid_payment_survives_cancellation_as_paid() -> anyhow::Result<()> {
    // Refund-on-cancel skips payments already settled; money actually
    // received is reconciled out of band.
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "erin", UserRole::Patient).await;
    let staff = create_user(&ctx, "admin", UserRole::Staff).await;
    let equipment = sample_equipment(&ctx, 2).await;

    let (purchase, payment) = ctx
        .checkout_service
        .purchase_equipment(PurchaseEquipmentRequest {
            customer_id: patient.id,
            equipment_id: equipment.id,
            quantity: 1,
            discount: Decimal::ZERO,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;
    ctx.payment_service
        .transition(
            payment.id,
            PaymentAction::StaffApprove { staff_id: staff.id },
            &staff,
        )
        .await?;

    ctx.checkout_service
        .cancel_purchase(purchase.id, &patient)
        .await?;

    let stored = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn service_price_must_stay_in_the_advertised_band() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "frank", UserRole::Patient).await;
    let service = sample_service(&ctx, "800.00", "2500.00").await;

    let err = ctx
        .checkout_service
        .book_service(BookServiceRequest {
            patient_id: patient.id,
            service_id: service.id,
            appointment_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            appointment_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            service_address: "12 Hill Road".to_string(),
            service_price: dec("500.00"),
            additional_charges: Decimal::ZERO,
            patient_notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn negative_additional_charges_are_rejected() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "grace", UserRole::Patient).await;
    let service = sample_service(&ctx, "800.00", "2500.00").await;

    let err = ctx
        .checkout_service
        .book_service(BookServiceRequest {
            patient_id: patient.id,
            service_id: service.id,
            appointment_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            appointment_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            service_address: "12 Hill Road".to_string(),
            service_price: dec("1000.00"),
            additional_charges: dec("-50.00"),
            patient_notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}
