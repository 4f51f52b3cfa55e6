use chrono::{NaiveDate, NaiveTime, Utc};
use clap::Parser;
use fake::faker::address::en::StreetName;
use fake::faker::internet::en::Username;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use uuid::Uuid;

use carelink::{
    domain::*,
    ledger::PaymentAction,
    notifications::NotificationHub,
    repository::{BookingRepository, CatalogRepository, OrderRepository, UserRepository},
    service::ServiceContext,
};

/// Seed the database with demo users, catalog entries and orders in
/// various payment states.
#[derive(Parser)]
struct Args {
    /// Database to seed
    #[arg(long, default_value = "sqlite:carelink.db")]
    database_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Seeding {}...", args.database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let hub = Arc::new(NotificationHub::new());
    let ctx = ServiceContext::new(db_pool, hub);

    // Users
    println!("Creating users...");
    let staff = ctx
        .user_repo
        .create(CreateUserRequest {
            username: "admin".to_string(),
            full_name: "Admin User".to_string(),
            email: "admin@carelink.local".to_string(),
            role: UserRole::Staff,
        })
        .await?;

    let provider = ctx
        .user_repo
        .create(CreateUserRequest {
            username: Username().fake(),
            full_name: Name().fake(),
            email: "provider@example.com".to_string(),
            role: UserRole::Provider,
        })
        .await?;

    let mut patients = Vec::new();
    for i in 0..3 {
        let patient = ctx
            .user_repo
            .create(CreateUserRequest {
                username: format!("patient{}", i + 1),
                full_name: Name().fake(),
                email: format!("patient{}@example.com", i + 1),
                role: UserRole::Patient,
            })
            .await?;
        patients.push(patient);
    }
    println!("  {} users created", patients.len() + 2);

    // Catalog
    println!("Creating catalog entries...");
    let now = Utc::now();
    let service = ctx
        .catalog_repo
        .create_service(Service {
            id: Uuid::new_v4(),
            name: "Home Nursing Visit".to_string(),
            description: Some("General nursing care at the patient's home".to_string()),
            price_min: Decimal::new(800_00, 2),
            price_max: Decimal::new(2500_00, 2),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let medicine = ctx
        .catalog_repo
        .create_medicine(Medicine {
            id: Uuid::new_v4(),
            name: "Paracetamol 500mg (100 tabs)".to_string(),
            unit_price: Decimal::new(250_00, 2),
            stock_quantity: 40,
            requires_prescription: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let equipment = ctx
        .catalog_repo
        .create_equipment(Equipment {
            id: Uuid::new_v4(),
            name: "Wheelchair, foldable".to_string(),
            rent_price_daily: Decimal::new(150_00, 2),
            rent_price_weekly: Decimal::new(900_00, 2),
            rent_price_monthly: Decimal::new(3000_00, 2),
            security_deposit: Decimal::new(2000_00, 2),
            purchase_price: Decimal::new(12000_00, 2),
            total_units: 10,
            available_units: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    // Orders in various payment states
    println!("Creating orders and payments...");
    let alice = &patients[0];
    let bob = &patients[1];
    let carol = &patients[2];

    // Alice books a service, completes it, and confirms cash.
    let (booking, booking_payment) = ctx
        .checkout_service
        .book_service(BookServiceRequest {
            patient_id: alice.id,
            service_id: service.id,
            appointment_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            appointment_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            service_address: StreetName().fake(),
            service_price: Decimal::new(1200_00, 2),
            additional_charges: Decimal::ZERO,
            patient_notes: None,
        })
        .await?;
    ctx.booking_repo
        .update_booking_status(booking.id, BookingStatus::Completed)
        .await?;
    ctx.payment_service
        .transition(booking_payment.id, PaymentAction::ConfirmCash, alice)
        .await?;

    // Bob orders medicine and submits online proof; staff approves.
    let (_, order_payment) = ctx
        .checkout_service
        .order_medicine(PlaceOrderRequest {
            customer_id: bob.id,
            medicine_id: medicine.id,
            quantity: 2,
            delivery_address: StreetName().fake(),
            delivery_phone: PhoneNumber().fake(),
        })
        .await?;
    ctx.payment_service
        .transition(
            order_payment.id,
            PaymentAction::SubmitProof {
                transaction_id: "TXN-DEMO-001".to_string(),
                proof_url: Some("payments/proofs/demo-001.png".to_string()),
            },
            bob,
        )
        .await?;
    ctx.payment_service
        .transition(
            order_payment.id,
            PaymentAction::StaffApprove { staff_id: staff.id },
            &staff,
        )
        .await?;

    // Carol books an appointment (left unpaid) and cancels a rental.
    ctx.checkout_service
        .book_appointment(BookAppointmentRequest {
            patient_id: carol.id,
            provider_id: provider.id,
            appointment_type: AppointmentType::Consultation,
            appointment_date: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
            appointment_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            duration_minutes: 30,
            location_type: LocationType::Video,
            reason: "Follow-up on blood pressure readings".to_string(),
            consultation_fee: Decimal::new(500_00, 2),
            additional_charges: Decimal::ZERO,
        })
        .await?;

    let (rental, _) = ctx
        .checkout_service
        .rent_equipment(RentEquipmentRequest {
            customer_id: carol.id,
            equipment_id: equipment.id,
            rental_period: RentalPeriod::Weekly,
            quantity: 1,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            delivery_address: StreetName().fake(),
            delivery_phone: PhoneNumber().fake(),
        })
        .await?;
    ctx.order_repo
        .update_rental_status(rental.id, RentalStatus::Confirmed)
        .await?;
    ctx.checkout_service.cancel_rental(rental.id, carol).await?;

    for patient in &patients {
        let balance = ctx.balance_service.balance_for(patient.id).await?;
        println!(
            "  {}: gross {} / paid {} / net unpaid {}",
            patient.username, balance.gross_total, balance.paid_amount, balance.net_unpaid
        );
    }

    println!("Done.");
    Ok(())
}
