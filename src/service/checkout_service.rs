use std::sync::Arc;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    notifications::{NotificationEvent, NotificationHub},
    repository::{BookingRepository, CatalogRepository, OrderRepository, PaymentRepository},
};

/// Order intake and cancellation. Creating a chargeable, decrementing
/// stock and writing its unpaid payment row happen inside one
/// transaction: a failure anywhere rolls back everything. Cancellation is
/// its own, later transaction that restores stock and refunds the linked
/// payment.
pub struct CheckoutService {
    pool: SqlitePool,
    catalog_repo: Arc<dyn CatalogRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    order_repo: Arc<dyn OrderRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    notification_hub: Arc<NotificationHub>,
}

impl CheckoutService {
    pub fn new(
        pool: SqlitePool,
        catalog_repo: Arc<dyn CatalogRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        order_repo: Arc<dyn OrderRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        notification_hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            pool,
            catalog_repo,
            booking_repo,
            order_repo,
            payment_repo,
            notification_hub,
        }
    }

    /// Flat delivery fee applied to pharmacy and equipment deliveries.
    fn flat_delivery_charge() -> Decimal {
        Decimal::new(100_00, 2)
    }

    fn order_number(prefix: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("{}{}", prefix, id[..8].to_uppercase())
    }

    fn require_positive_quantity(quantity: i64) -> Result<()> {
        if quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn require_non_negative(amount: Decimal, field: &str) -> Result<()> {
        if amount < Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "{} cannot be negative",
                field
            )));
        }
        Ok(())
    }

    pub async fn book_service(
        &self,
        request: BookServiceRequest,
    ) -> Result<(ServiceBooking, Payment)> {
        Self::require_non_negative(request.additional_charges, "Additional charges")?;

        let service = self
            .catalog_repo
            .find_service(request.service_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;
        if !service.is_active {
            return Err(AppError::Validation("Service is not available".to_string()));
        }
        if !service.price_in_range(request.service_price) {
            return Err(AppError::Validation(format!(
                "Service price must be between {} and {}",
                service.price_min, service.price_max
            )));
        }

        let now = Utc::now();
        let booking = ServiceBooking {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            provider_id: None,
            service_id: service.id,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            service_address: request.service_address,
            service_price: request.service_price,
            additional_charges: request.additional_charges,
            final_price: None,
            total_amount: ServiceBooking::compute_total(
                request.service_price,
                None,
                request.additional_charges,
            ),
            status: BookingStatus::Pending,
            patient_notes: request.patient_notes,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        let payment = self
            .new_payment(
                booking.patient_id,
                ChargeableRef {
                    kind: ChargeableKind::ServiceBooking,
                    id: booking.id,
                },
                booking.total_amount,
            )
            .await?;

        let mut tx = self.pool.begin().await?;
        insert_booking(&mut tx, &booking).await?;
        insert_payment(&mut tx, &payment).await?;
        tx.commit().await?;

        self.notify_placed(&payment, booking.id.to_string()).await;
        Ok((booking, payment))
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<(PersonalAppointment, Payment)> {
        Self::require_non_negative(request.consultation_fee, "Consultation fee")?;
        Self::require_non_negative(request.additional_charges, "Additional charges")?;
        if request.duration_minutes < 1 {
            return Err(AppError::Validation(
                "Appointment duration must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let appointment = PersonalAppointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            provider_id: request.provider_id,
            appointment_type: request.appointment_type,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            duration_minutes: request.duration_minutes,
            location_type: request.location_type,
            reason: request.reason,
            consultation_fee: request.consultation_fee,
            additional_charges: request.additional_charges,
            total_fee: PersonalAppointment::compute_total(
                request.consultation_fee,
                request.additional_charges,
            ),
            status: AppointmentStatus::Pending,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        let payment = self
            .new_payment(
                appointment.patient_id,
                ChargeableRef {
                    kind: ChargeableKind::PersonalAppointment,
                    id: appointment.id,
                },
                appointment.total_fee,
            )
            .await?;

        let mut tx = self.pool.begin().await?;
        insert_appointment(&mut tx, &appointment).await?;
        insert_payment(&mut tx, &payment).await?;
        tx.commit().await?;

        self.notify_placed(&payment, appointment.id.to_string()).await;
        Ok((appointment, payment))
    }

    pub async fn order_medicine(
        &self,
        request: PlaceOrderRequest,
    ) -> Result<(PharmacyOrder, Payment)> {
        Self::require_positive_quantity(request.quantity)?;

        let medicine = self
            .catalog_repo
            .find_medicine(request.medicine_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine not found".to_string()))?;
        if !medicine.is_active {
            return Err(AppError::Validation("Medicine is not available".to_string()));
        }

        let now = Utc::now();
        let subtotal = PharmacyOrder::compute_subtotal(medicine.unit_price, request.quantity);
        let delivery_charge = Self::flat_delivery_charge();
        let order = PharmacyOrder {
            id: Uuid::new_v4(),
            order_number: Self::order_number("PO"),
            customer_id: request.customer_id,
            medicine_id: medicine.id,
            quantity: request.quantity,
            unit_price: medicine.unit_price,
            subtotal,
            delivery_charge,
            total_amount: PharmacyOrder::compute_total(subtotal, delivery_charge),
            status: OrderStatus::Pending,
            delivery_address: request.delivery_address,
            delivery_phone: request.delivery_phone,
            created_at: now,
            updated_at: now,
        };

        let payment = self
            .new_payment(
                order.customer_id,
                ChargeableRef {
                    kind: ChargeableKind::PharmacyOrder,
                    id: order.id,
                },
                order.total_amount,
            )
            .await?;

        let mut tx = self.pool.begin().await?;
        take_medicine_stock(&mut tx, medicine.id, request.quantity).await?;
        insert_order(&mut tx, &order).await?;
        insert_payment(&mut tx, &payment).await?;
        tx.commit().await?;

        self.notify_placed(&payment, order.order_number.clone()).await;
        Ok((order, payment))
    }

    pub async fn purchase_equipment(
        &self,
        request: PurchaseEquipmentRequest,
    ) -> Result<(EquipmentPurchase, Payment)> {
        Self::require_positive_quantity(request.quantity)?;
        Self::require_non_negative(request.discount, "Discount")?;

        let equipment = self
            .catalog_repo
            .find_equipment(request.equipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))?;
        if !equipment.is_active {
            return Err(AppError::Validation(
                "Equipment is not available".to_string(),
            ));
        }

        let now = Utc::now();
        let subtotal = EquipmentPurchase::compute_subtotal(equipment.purchase_price, request.quantity);
        let delivery_charge = Self::flat_delivery_charge();
        if request.discount > subtotal + delivery_charge {
            return Err(AppError::Validation(
                "Discount cannot exceed the order total".to_string(),
            ));
        }

        let purchase = EquipmentPurchase {
            id: Uuid::new_v4(),
            order_number: Self::order_number("EP"),
            customer_id: request.customer_id,
            equipment_id: equipment.id,
            quantity: request.quantity,
            unit_price: equipment.purchase_price,
            subtotal,
            delivery_charge,
            discount: request.discount,
            total_amount: EquipmentPurchase::compute_total(
                subtotal,
                delivery_charge,
                request.discount,
            ),
            status: PurchaseStatus::Pending,
            delivery_address: request.delivery_address,
            delivery_phone: request.delivery_phone,
            created_at: now,
            updated_at: now,
        };

        let payment = self
            .new_payment(
                purchase.customer_id,
                ChargeableRef {
                    kind: ChargeableKind::EquipmentPurchase,
                    id: purchase.id,
                },
                purchase.total_amount,
            )
            .await?;

        let mut tx = self.pool.begin().await?;
        take_equipment_units(&mut tx, equipment.id, request.quantity).await?;
        insert_purchase(&mut tx, &purchase).await?;
        insert_payment(&mut tx, &payment).await?;
        tx.commit().await?;

        self.notify_placed(&payment, purchase.order_number.clone()).await;
        Ok((purchase, payment))
    }

    pub async fn rent_equipment(
        &self,
        request: RentEquipmentRequest,
    ) -> Result<(EquipmentRental, Payment)> {
        Self::require_positive_quantity(request.quantity)?;
        if request.end_date < request.start_date {
            return Err(AppError::Validation(
                "Rental end date cannot be before the start date".to_string(),
            ));
        }

        let equipment = self
            .catalog_repo
            .find_equipment(request.equipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))?;
        if !equipment.is_active {
            return Err(AppError::Validation(
                "Equipment is not available".to_string(),
            ));
        }

        let days = (request.end_date - request.start_date).num_days() + 1;
        let rental_price = rental_price_for(&equipment, request.rental_period, days)
            * Decimal::from(request.quantity);
        let security_deposit = equipment.security_deposit * Decimal::from(request.quantity);

        let now = Utc::now();
        let rental = EquipmentRental {
            id: Uuid::new_v4(),
            rental_number: Self::order_number("ER"),
            customer_id: request.customer_id,
            equipment_id: equipment.id,
            rental_period: request.rental_period,
            quantity: request.quantity,
            start_date: request.start_date,
            end_date: request.end_date,
            rental_price,
            security_deposit,
            delivery_charge: Decimal::ZERO,
            late_fee: Decimal::ZERO,
            damage_charge: Decimal::ZERO,
            total_amount: EquipmentRental::compute_total(
                rental_price,
                security_deposit,
                Decimal::ZERO,
                Decimal::ZERO,
                Decimal::ZERO,
            ),
            status: RentalStatus::Pending,
            delivery_address: request.delivery_address,
            delivery_phone: request.delivery_phone,
            actual_return_date: None,
            created_at: now,
            updated_at: now,
        };

        let payment = self
            .new_payment(
                rental.customer_id,
                ChargeableRef {
                    kind: ChargeableKind::EquipmentRental,
                    id: rental.id,
                },
                rental.total_amount,
            )
            .await?;

        let mut tx = self.pool.begin().await?;
        take_equipment_units(&mut tx, equipment.id, request.quantity).await?;
        insert_rental(&mut tx, &rental).await?;
        insert_payment(&mut tx, &payment).await?;
        tx.commit().await?;

        self.notify_placed(&payment, rental.rental_number.clone()).await;
        Ok((rental, payment))
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        actor: &User,
        reason: Option<String>,
    ) -> Result<ServiceBooking> {
        let mut tx = self.pool.begin().await?;

        let (patient_id, status): (String, String) = sqlx::query_as(
            "SELECT patient_id, status FROM service_bookings WHERE id = ?",
        )
        .bind(booking_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Service booking not found".to_string()))?;

        check_owner(actor, &patient_id)?;
        let status = BookingStatus::parse(&status)
            .ok_or_else(|| AppError::Database(format!("Invalid booking status: {}", status)))?;
        if !matches!(status, BookingStatus::Pending | BookingStatus::Confirmed) {
            return Err(AppError::Validation(
                "Only pending or confirmed bookings can be cancelled".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE service_bookings
            SET status = 'cancelled', cancellation_reason = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&reason)
        .bind(Utc::now().naive_utc())
        .bind(booking_id.to_string())
        .execute(&mut *tx)
        .await?;

        let reference = ChargeableRef {
            kind: ChargeableKind::ServiceBooking,
            id: booking_id,
        };
        let refunded = refund_linked_payments(&mut tx, reference).await?;
        tx.commit().await?;

        self.notify_cancelled(reference, actor.id, refunded).await;

        self.find_booking_after_cancel(booking_id).await
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        actor: &User,
        reason: Option<String>,
    ) -> Result<PersonalAppointment> {
        let mut tx = self.pool.begin().await?;

        let (patient_id, provider_id, status): (String, String, String) = sqlx::query_as(
            "SELECT patient_id, provider_id, status FROM personal_appointments WHERE id = ?",
        )
        .bind(appointment_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Personal appointment not found".to_string()))?;

        let is_provider = provider_id == actor.id.to_string();
        if !actor.is_staff() && !is_provider {
            check_owner(actor, &patient_id)?;
        }
        let status = AppointmentStatus::parse(&status)
            .ok_or_else(|| AppError::Database(format!("Invalid appointment status: {}", status)))?;
        if !matches!(status, AppointmentStatus::Pending | AppointmentStatus::Confirmed) {
            return Err(AppError::Validation(
                "Only pending or confirmed appointments can be cancelled".to_string(),
            ));
        }

        let new_status = if is_provider || actor.is_staff() {
            AppointmentStatus::CancelledByProvider
        } else {
            AppointmentStatus::CancelledByPatient
        };

        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            UPDATE personal_appointments
            SET status = ?, cancellation_reason = ?, cancelled_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(new_status.as_str())
        .bind(&reason)
        .bind(now)
        .bind(now)
        .bind(appointment_id.to_string())
        .execute(&mut *tx)
        .await?;

        let reference = ChargeableRef {
            kind: ChargeableKind::PersonalAppointment,
            id: appointment_id,
        };
        let refunded = refund_linked_payments(&mut tx, reference).await?;
        tx.commit().await?;

        self.notify_cancelled(reference, actor.id, refunded).await;

        self.find_appointment_after_cancel(appointment_id).await
    }

    pub async fn cancel_order(&self, order_id: Uuid, actor: &User) -> Result<PharmacyOrder> {
        let mut tx = self.pool.begin().await?;

        let (customer_id, medicine_id, quantity, status): (String, String, i64, String) =
            sqlx::query_as(
                "SELECT customer_id, medicine_id, quantity, status FROM pharmacy_orders WHERE id = ?",
            )
            .bind(order_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Pharmacy order not found".to_string()))?;

        check_owner(actor, &customer_id)?;
        let status = OrderStatus::parse(&status)
            .ok_or_else(|| AppError::Database(format!("Invalid order status: {}", status)))?;
        if !matches!(status, OrderStatus::Pending | OrderStatus::Confirmed) {
            return Err(AppError::Validation(
                "Only pending or confirmed orders can be cancelled".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        sqlx::query("UPDATE pharmacy_orders SET status = 'cancelled', updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(order_id.to_string())
            .execute(&mut *tx)
            .await?;

        // Put the reserved units back on the shelf.
        sqlx::query(
            "UPDATE medicines SET stock_quantity = stock_quantity + ?, updated_at = ? WHERE id = ?",
        )
        .bind(quantity)
        .bind(now)
        .bind(&medicine_id)
        .execute(&mut *tx)
        .await?;

        let reference = ChargeableRef {
            kind: ChargeableKind::PharmacyOrder,
            id: order_id,
        };
        let refunded = refund_linked_payments(&mut tx, reference).await?;
        tx.commit().await?;

        self.notify_cancelled(reference, actor.id, refunded).await;

        self.find_order_after_cancel(order_id).await
    }

    pub async fn cancel_purchase(
        &self,
        purchase_id: Uuid,
        actor: &User,
    ) -> Result<EquipmentPurchase> {
        let mut tx = self.pool.begin().await?;

        let (customer_id, equipment_id, quantity, status): (String, String, i64, String) =
            sqlx::query_as(
                "SELECT customer_id, equipment_id, quantity, status FROM equipment_purchases WHERE id = ?",
            )
            .bind(purchase_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Equipment purchase not found".to_string()))?;

        check_owner(actor, &customer_id)?;
        let status = PurchaseStatus::parse(&status)
            .ok_or_else(|| AppError::Database(format!("Invalid purchase status: {}", status)))?;
        if !matches!(status, PurchaseStatus::Pending | PurchaseStatus::Confirmed) {
            return Err(AppError::Validation(
                "Only pending or confirmed purchases can be cancelled".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        sqlx::query(
            "UPDATE equipment_purchases SET status = 'cancelled', updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(purchase_id.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE equipment SET available_units = available_units + ?, updated_at = ? WHERE id = ?",
        )
        .bind(quantity)
        .bind(now)
        .bind(&equipment_id)
        .execute(&mut *tx)
        .await?;

        let reference = ChargeableRef {
            kind: ChargeableKind::EquipmentPurchase,
            id: purchase_id,
        };
        let refunded = refund_linked_payments(&mut tx, reference).await?;
        tx.commit().await?;

        self.notify_cancelled(reference, actor.id, refunded).await;

        self.find_purchase_after_cancel(purchase_id).await
    }

    pub async fn cancel_rental(&self, rental_id: Uuid, actor: &User) -> Result<EquipmentRental> {
        let mut tx = self.pool.begin().await?;

        let (customer_id, equipment_id, quantity, status): (String, String, i64, String) =
            sqlx::query_as(
                "SELECT customer_id, equipment_id, quantity, status FROM equipment_rentals WHERE id = ?",
            )
            .bind(rental_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Equipment rental not found".to_string()))?;

        check_owner(actor, &customer_id)?;
        let status = RentalStatus::parse(&status)
            .ok_or_else(|| AppError::Database(format!("Invalid rental status: {}", status)))?;
        if !matches!(status, RentalStatus::Pending | RentalStatus::Confirmed) {
            return Err(AppError::Validation(
                "Only pending or confirmed rentals can be cancelled".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        sqlx::query(
            "UPDATE equipment_rentals SET status = 'cancelled', updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(rental_id.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE equipment SET available_units = available_units + ?, updated_at = ? WHERE id = ?",
        )
        .bind(quantity)
        .bind(now)
        .bind(&equipment_id)
        .execute(&mut *tx)
        .await?;

        let reference = ChargeableRef {
            kind: ChargeableKind::EquipmentRental,
            id: rental_id,
        };
        let refunded = refund_linked_payments(&mut tx, reference).await?;
        tx.commit().await?;

        self.notify_cancelled(reference, actor.id, refunded).await;

        self.find_rental_after_cancel(rental_id).await
    }

    /// New unpaid ledger entry, method pre-filled from the user's stored
    /// default when one exists.
    async fn new_payment(
        &self,
        user_id: Uuid,
        chargeable: ChargeableRef,
        amount: Decimal,
    ) -> Result<Payment> {
        let method = self.payment_repo.default_method_for(user_id).await?;
        Ok(Payment::new(user_id, chargeable, amount, method))
    }

    async fn notify_placed(&self, payment: &Payment, reference: String) {
        if let Some(chargeable) = payment.chargeable {
            self.notification_hub
                .publish(NotificationEvent::OrderPlaced {
                    user_id: payment.user_id,
                    chargeable,
                    reference,
                })
                .await;
        }
    }

    async fn notify_cancelled(
        &self,
        reference: ChargeableRef,
        user_id: Uuid,
        refunded: Vec<(Uuid, PaymentStatus)>,
    ) {
        self.notification_hub
            .publish(NotificationEvent::OrderCancelled {
                user_id,
                chargeable: reference,
            })
            .await;

        for (payment_id, previous) in refunded {
            match self.payment_repo.find_by_id(payment_id).await {
                Ok(Some(payment)) => {
                    self.notification_hub
                        .publish(NotificationEvent::PaymentStatusChanged { payment, previous })
                        .await;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to load refunded payment {}: {:?}", payment_id, e),
            }
        }
    }

    async fn find_booking_after_cancel(&self, id: Uuid) -> Result<ServiceBooking> {
        self.booking_repo
            .find_booking(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to reload cancelled booking".to_string()))
    }

    async fn find_appointment_after_cancel(&self, id: Uuid) -> Result<PersonalAppointment> {
        self.booking_repo
            .find_appointment(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to reload cancelled appointment".to_string()))
    }

    async fn find_order_after_cancel(&self, id: Uuid) -> Result<PharmacyOrder> {
        self.order_repo
            .find_order(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to reload cancelled order".to_string()))
    }

    async fn find_purchase_after_cancel(&self, id: Uuid) -> Result<EquipmentPurchase> {
        self.order_repo
            .find_purchase(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to reload cancelled purchase".to_string()))
    }

    async fn find_rental_after_cancel(&self, id: Uuid) -> Result<EquipmentRental> {
        self.order_repo
            .find_rental(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to reload cancelled rental".to_string()))
    }
}

fn check_owner(actor: &User, owner_id: &str) -> Result<()> {
    if actor.is_staff() || owner_id == actor.id.to_string() {
        Ok(())
    } else {
        // Not yours: indistinguishable from not existing.
        Err(AppError::NotFound("Record not found".to_string()))
    }
}

fn rental_price_for(equipment: &Equipment, period: RentalPeriod, days: i64) -> Decimal {
    match period {
        RentalPeriod::Daily => equipment.rent_price_daily * Decimal::from(days),
        RentalPeriod::Weekly => {
            let weeks = (days + 6) / 7;
            equipment.rent_price_weekly * Decimal::from(weeks)
        }
        RentalPeriod::Monthly => {
            let months = (days + 29) / 30;
            equipment.rent_price_monthly * Decimal::from(months)
        }
    }
}

/// Guarded decrement: refuses to go below zero, which fails the whole
/// checkout transaction.
async fn take_medicine_stock(
    tx: &mut Transaction<'_, Sqlite>,
    medicine_id: Uuid,
    quantity: i64,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE medicines
        SET stock_quantity = stock_quantity - ?, updated_at = ?
        WHERE id = ? AND stock_quantity >= ?
        "#,
    )
    .bind(quantity)
    .bind(Utc::now().naive_utc())
    .bind(medicine_id.to_string())
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Validation(
            "Not enough units in stock".to_string(),
        ));
    }
    Ok(())
}

async fn take_equipment_units(
    tx: &mut Transaction<'_, Sqlite>,
    equipment_id: Uuid,
    quantity: i64,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE equipment
        SET available_units = available_units - ?, updated_at = ?
        WHERE id = ? AND available_units >= ?
        "#,
    )
    .bind(quantity)
    .bind(Utc::now().naive_utc())
    .bind(equipment_id.to_string())
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Validation(
            "Not enough units available".to_string(),
        ));
    }
    Ok(())
}

/// Refund the payments tied to a cancelled chargeable, except those
/// already paid or refunded. Returns what changed so the caller can
/// notify after commit.
async fn refund_linked_payments(
    tx: &mut Transaction<'_, Sqlite>,
    reference: ChargeableRef,
) -> Result<Vec<(Uuid, PaymentStatus)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT id, status FROM payments
        WHERE chargeable_kind = ? AND chargeable_id = ?
          AND status NOT IN ('paid', 'refunded')
        "#,
    )
    .bind(reference.kind.as_str())
    .bind(reference.id.to_string())
    .fetch_all(&mut **tx)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query(
        r#"
        UPDATE payments
        SET status = 'refunded', updated_at = ?
        WHERE chargeable_kind = ? AND chargeable_id = ?
          AND status NOT IN ('paid', 'refunded')
        "#,
    )
    .bind(Utc::now().naive_utc())
    .bind(reference.kind.as_str())
    .bind(reference.id.to_string())
    .execute(&mut **tx)
    .await?;

    rows.into_iter()
        .map(|(id, status)| {
            let id = Uuid::parse_str(&id).map_err(|e| AppError::Database(e.to_string()))?;
            let status = PaymentStatus::parse(&status)
                .ok_or_else(|| AppError::Database(format!("Invalid payment status: {}", status)))?;
            Ok((id, status))
        })
        .collect()
}

async fn insert_booking(tx: &mut Transaction<'_, Sqlite>, booking: &ServiceBooking) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO service_bookings (
            id, patient_id, provider_id, service_id, appointment_date,
            appointment_time, service_address, service_price, additional_charges,
            final_price, total_amount, status, patient_notes,
            cancellation_reason, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(booking.id.to_string())
    .bind(booking.patient_id.to_string())
    .bind(booking.provider_id.map(|id| id.to_string()))
    .bind(booking.service_id.to_string())
    .bind(booking.appointment_date)
    .bind(booking.appointment_time)
    .bind(&booking.service_address)
    .bind(booking.service_price.to_string())
    .bind(booking.additional_charges.to_string())
    .bind(booking.final_price.map(|p| p.to_string()))
    .bind(booking.total_amount.to_string())
    .bind(booking.status.as_str())
    .bind(&booking.patient_notes)
    .bind(&booking.cancellation_reason)
    .bind(booking.created_at.naive_utc())
    .bind(booking.updated_at.naive_utc())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_appointment(
    tx: &mut Transaction<'_, Sqlite>,
    appointment: &PersonalAppointment,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO personal_appointments (
            id, patient_id, provider_id, appointment_type, appointment_date,
            appointment_time, duration_minutes, location_type, reason,
            consultation_fee, additional_charges, total_fee, status,
            cancellation_reason, cancelled_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(appointment.id.to_string())
    .bind(appointment.patient_id.to_string())
    .bind(appointment.provider_id.to_string())
    .bind(appointment.appointment_type.as_str())
    .bind(appointment.appointment_date)
    .bind(appointment.appointment_time)
    .bind(appointment.duration_minutes)
    .bind(appointment.location_type.as_str())
    .bind(&appointment.reason)
    .bind(appointment.consultation_fee.to_string())
    .bind(appointment.additional_charges.to_string())
    .bind(appointment.total_fee.to_string())
    .bind(appointment.status.as_str())
    .bind(&appointment.cancellation_reason)
    .bind(appointment.cancelled_at.map(|dt| dt.naive_utc()))
    .bind(appointment.created_at.naive_utc())
    .bind(appointment.updated_at.naive_utc())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_order(tx: &mut Transaction<'_, Sqlite>, order: &PharmacyOrder) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pharmacy_orders (
            id, order_number, customer_id, medicine_id, quantity, unit_price,
            subtotal, delivery_charge, total_amount, status, delivery_address,
            delivery_phone, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(order.id.to_string())
    .bind(&order.order_number)
    .bind(order.customer_id.to_string())
    .bind(order.medicine_id.to_string())
    .bind(order.quantity)
    .bind(order.unit_price.to_string())
    .bind(order.subtotal.to_string())
    .bind(order.delivery_charge.to_string())
    .bind(order.total_amount.to_string())
    .bind(order.status.as_str())
    .bind(&order.delivery_address)
    .bind(&order.delivery_phone)
    .bind(order.created_at.naive_utc())
    .bind(order.updated_at.naive_utc())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_purchase(
    tx: &mut Transaction<'_, Sqlite>,
    purchase: &EquipmentPurchase,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO equipment_purchases (
            id, order_number, customer_id, equipment_id, quantity, unit_price,
            subtotal, delivery_charge, discount, total_amount, status,
            delivery_address, delivery_phone, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(purchase.id.to_string())
    .bind(&purchase.order_number)
    .bind(purchase.customer_id.to_string())
    .bind(purchase.equipment_id.to_string())
    .bind(purchase.quantity)
    .bind(purchase.unit_price.to_string())
    .bind(purchase.subtotal.to_string())
    .bind(purchase.delivery_charge.to_string())
    .bind(purchase.discount.to_string())
    .bind(purchase.total_amount.to_string())
    .bind(purchase.status.as_str())
    .bind(&purchase.delivery_address)
    .bind(&purchase.delivery_phone)
    .bind(purchase.created_at.naive_utc())
    .bind(purchase.updated_at.naive_utc())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_rental(tx: &mut Transaction<'_, Sqlite>, rental: &EquipmentRental) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO equipment_rentals (
            id, rental_number, customer_id, equipment_id, rental_period,
            quantity, start_date, end_date, rental_price, security_deposit,
            delivery_charge, late_fee, damage_charge, total_amount, status,
            delivery_address, delivery_phone, actual_return_date,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(rental.id.to_string())
    .bind(&rental.rental_number)
    .bind(rental.customer_id.to_string())
    .bind(rental.equipment_id.to_string())
    .bind(rental.rental_period.as_str())
    .bind(rental.quantity)
    .bind(rental.start_date)
    .bind(rental.end_date)
    .bind(rental.rental_price.to_string())
    .bind(rental.security_deposit.to_string())
    .bind(rental.delivery_charge.to_string())
    .bind(rental.late_fee.to_string())
    .bind(rental.damage_charge.to_string())
    .bind(rental.total_amount.to_string())
    .bind(rental.status.as_str())
    .bind(&rental.delivery_address)
    .bind(&rental.delivery_phone)
    .bind(rental.actual_return_date)
    .bind(rental.created_at.naive_utc())
    .bind(rental.updated_at.naive_utc())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_payment(tx: &mut Transaction<'_, Sqlite>, payment: &Payment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, user_id, chargeable_kind, chargeable_id, amount, method,
            status, transaction_id, proof_url, verified_by, verified_at,
            paid_at, notes, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payment.id.to_string())
    .bind(payment.user_id.to_string())
    .bind(payment.chargeable.map(|c| c.kind.as_str()))
    .bind(payment.chargeable.map(|c| c.id.to_string()))
    .bind(payment.amount.to_string())
    .bind(payment.method.map(|m| m.as_str()))
    .bind(payment.status.as_str())
    .bind(&payment.transaction_id)
    .bind(&payment.proof_url)
    .bind(payment.verified_by.map(|id| id.to_string()))
    .bind(payment.verified_at.map(|dt| dt.naive_utc()))
    .bind(payment.paid_at.map(|dt| dt.naive_utc()))
    .bind(&payment.notes)
    .bind(payment.created_at.naive_utc())
    .bind(payment.updated_at.naive_utc())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
