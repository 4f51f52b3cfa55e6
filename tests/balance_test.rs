mod common;

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use carelink::{
    domain::*,
    ledger::PaymentAction,
    repository::{BookingRepository, PaymentRepository},
};
use common::*;

fn booking_request(patient: &User, service: &Service, price: &str) -> BookServiceRequest {
    BookServiceRequest {
        patient_id: patient.id,
        service_id: service.id,
        appointment_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        service_address: "12 Hill Road".to_string(),
        service_price: dec(price),
        additional_charges: Decimal::ZERO,
        patient_notes: None,
    }
}

#[tokio::test]
async fn fully_paid_booking_nets_to_zero() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "alice", UserRole::Patient).await;
    let staff = create_user(&ctx, "admin", UserRole::Staff).await;
    let service = sample_service(&ctx, "800.00", "2500.00").await;

    let (booking, payment) = ctx
        .checkout_service
        .book_service(booking_request(&patient, &service, "1200.00"))
        .await?;
    ctx.booking_repo
        .update_booking_status(booking.id, BookingStatus::Confirmed)
        .await?;
    ctx.payment_service
        .transition(
            payment.id,
            PaymentAction::StaffApprove { staff_id: staff.id },
            &staff,
        )
        .await?;

    let balance = ctx.balance_service.balance_for(patient.id).await?;
    assert_eq!(balance.gross_total, dec("1200.00"));
    assert_eq!(balance.paid_amount, dec("1200.00"));
    assert_eq!(balance.net_unpaid, dec("0.00"));

    Ok(())
}

#[tokio::test]
async fn cash_commitment_is_owed_but_not_actionable() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "bob", UserRole::Patient).await;
    // 200.00 x 2 + 100.00 delivery = 500.00
    let medicine = sample_medicine(&ctx, "200.00", 10).await;

    // Stored default pre-fills the payment method at checkout.
    ctx.payment_repo
        .save_preference(UserPaymentPreference {
            id: Uuid::new_v4(),
            user_id: patient.id,
            method: PaymentMethod::Cash,
            qr_code_url: None,
            bank_info: None,
            is_default: true,
            created_at: Utc::now(),
        })
        .await?;

    let (order, payment) = ctx
        .checkout_service
        .order_medicine(PlaceOrderRequest {
            customer_id: patient.id,
            medicine_id: medicine.id,
            quantity: 2,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;
    assert_eq!(order.total_amount, dec("500.00"));
    assert_eq!(payment.method, Some(PaymentMethod::Cash));
    assert_eq!(payment.status, PaymentStatus::Unpaid);

    let balance = ctx.balance_service.balance_for(patient.id).await?;
    assert_eq!(balance.gross_total, dec("500.00"));
    assert_eq!(balance.paid_amount, dec("0.00"));
    assert_eq!(balance.net_unpaid, dec("500.00"));
    assert_eq!(balance.actionable_unpaid, dec("0.00"));
    assert_eq!(balance.cash_total, dec("500.00"));

    Ok(())
}

#[tokio::test]
async fn cancelled_chargeables_drop_out_of_gross_and_buckets() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "carol", UserRole::Patient).await;
    let service = sample_service(&ctx, "800.00", "2500.00").await;

    let (kept, _) = ctx
        .checkout_service
        .book_service(booking_request(&patient, &service, "1000.00"))
        .await?;
    let (cancelled, cancelled_payment) = ctx
        .checkout_service
        .book_service(booking_request(&patient, &service, "900.00"))
        .await?;

    ctx.checkout_service
        .cancel_booking(cancelled.id, &patient, Some("changed plans".to_string()))
        .await?;

    let statement = ctx.balance_service.statement_for(patient.id).await?;
    assert_eq!(statement.balance.gross_total, dec("1000.00"));

    // The voided payment appears in no bucket, refunded included.
    let all_bucket_ids: Vec<Uuid> = statement
        .buckets
        .paid
        .iter()
        .chain(&statement.buckets.refunded)
        .chain(&statement.buckets.cash_committed)
        .chain(&statement.buckets.online_pending)
        .chain(&statement.buckets.actionable_unpaid)
        .map(|p| p.id)
        .collect();
    assert!(!all_bucket_ids.contains(&cancelled_payment.id));

    // The surviving booking's payment is still actionable.
    let kept_payments = ctx
        .payment_repo
        .find_by_chargeable(ChargeableRef {
            kind: ChargeableKind::ServiceBooking,
            id: kept.id,
        })
        .await?;
    assert!(all_bucket_ids.contains(&kept_payments[0].id));

    Ok(())
}

#[tokio::test]
async fn balance_is_idempotent_without_writes() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "dave", UserRole::Patient).await;
    let service = sample_service(&ctx, "800.00", "2500.00").await;
    ctx.checkout_service
        .book_service(booking_request(&patient, &service, "1500.00"))
        .await?;

    let first = ctx.balance_service.balance_for(patient.id).await?;
    let second = ctx.balance_service.balance_for(patient.id).await?;
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn dashboard_and_statement_agree_by_construction() -> anyhow::Result<()> {
    // The dashboard summary and the detailed statement both route through
    // BalanceService; the figures must be identical.
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "erin", UserRole::Patient).await;
    let service = sample_service(&ctx, "800.00", "2500.00").await;
    let medicine = sample_medicine(&ctx, "120.00", 5).await;

    ctx.checkout_service
        .book_service(booking_request(&patient, &service, "2000.00"))
        .await?;
    ctx.checkout_service
        .order_medicine(PlaceOrderRequest {
            customer_id: patient.id,
            medicine_id: medicine.id,
            quantity: 1,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;

    let summary = ctx.balance_service.balance_for(patient.id).await?;
    let statement = ctx.balance_service.statement_for(patient.id).await?;
    assert_eq!(summary, statement.balance);
    assert_eq!(
        statement.balance.net_unpaid,
        statement.balance.gross_total - statement.balance.paid_amount
    );

    Ok(())
}

#[tokio::test]
async fn gross_total_spans_all_five_kinds() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let patient = create_user(&ctx, "frank", UserRole::Patient).await;
    let provider = create_user(&ctx, "drprovider", UserRole::Provider).await;
    let service = sample_service(&ctx, "800.00", "2500.00").await;
    let medicine = sample_medicine(&ctx, "200.00", 10).await;
    let equipment = sample_equipment(&ctx, 5).await;

    ctx.checkout_service
        .book_service(booking_request(&patient, &service, "1000.00"))
        .await?;
    ctx.checkout_service
        .book_appointment(BookAppointmentRequest {
            patient_id: patient.id,
            provider_id: provider.id,
            appointment_type: AppointmentType::Consultation,
            appointment_date: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
            appointment_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            duration_minutes: 30,
            location_type: LocationType::Video,
            reason: "Consultation".to_string(),
            consultation_fee: dec("500.00"),
            additional_charges: Decimal::ZERO,
        })
        .await?;
    // 200 x 1 + 100 delivery = 300
    ctx.checkout_service
        .order_medicine(PlaceOrderRequest {
            customer_id: patient.id,
            medicine_id: medicine.id,
            quantity: 1,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;
    // 5000 x 1 + 100 delivery = 5100
    ctx.checkout_service
        .purchase_equipment(PurchaseEquipmentRequest {
            customer_id: patient.id,
            equipment_id: equipment.id,
            quantity: 1,
            discount: Decimal::ZERO,
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;
    // one week at 350.00 + 100.00 deposit = 450
    ctx.checkout_service
        .rent_equipment(RentEquipmentRequest {
            customer_id: patient.id,
            equipment_id: equipment.id,
            rental_period: RentalPeriod::Weekly,
            quantity: 1,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 11).unwrap(),
            delivery_address: "12 Hill Road".to_string(),
            delivery_phone: "9800000000".to_string(),
        })
        .await?;

    let balance = ctx.balance_service.balance_for(patient.id).await?;
    // 1000 + 500 + 300 + 5100 + 450
    assert_eq!(balance.gross_total, dec("7350.00"));

    Ok(())
}
