use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{ChargeableKind, ChargeableRef, Payment, User},
    error::{AppError, Result},
    ledger::{self, ChargeableState, PaymentAction},
    notifications::{NotificationEvent, NotificationHub},
    repository::{BookingRepository, OrderRepository, PaymentRepository},
};

/// Drives the payment state machine against the store: loads the payment,
/// resolves the linked chargeable's state, applies the transition and
/// persists on success. Notifies on every status change.
pub struct PaymentService {
    payment_repo: Arc<dyn PaymentRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    order_repo: Arc<dyn OrderRepository>,
    notification_hub: Arc<NotificationHub>,
}

impl PaymentService {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        order_repo: Arc<dyn OrderRepository>,
        notification_hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            payment_repo,
            booking_repo,
            order_repo,
            notification_hub,
        }
    }

    pub async fn get(&self, payment_id: Uuid, actor: &User) -> Result<Payment> {
        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        // A payment that isn't yours doesn't exist, as far as you can tell.
        if !actor.is_staff() && payment.user_id != actor.id {
            return Err(AppError::NotFound("Payment not found".to_string()));
        }

        Ok(payment)
    }

    pub async fn transition(
        &self,
        payment_id: Uuid,
        action: PaymentAction,
        actor: &User,
    ) -> Result<Payment> {
        let mut payment = self.get(payment_id, actor).await?;

        match action {
            PaymentAction::StaffApprove { .. } | PaymentAction::StaffReject { .. } => {
                if !actor.is_staff() {
                    return Err(AppError::Forbidden);
                }
            }
            _ => {}
        }

        let chargeable_state = match payment.chargeable {
            Some(reference) => self.chargeable_state(reference).await?,
            None => None,
        };

        // A cancelled chargeable voids its payment; the only move left is
        // the refund the cancellation itself triggers.
        if let Some(state) = chargeable_state {
            if state.cancelled && !matches!(action, PaymentAction::Refund) {
                return Err(AppError::Validation(
                    "The order behind this payment was cancelled".to_string(),
                ));
            }
        }

        let previous = payment.status;
        ledger::apply(&mut payment, action, chargeable_state, Utc::now())?;

        let updated = self
            .payment_repo
            .update(payment.id, payment, false)
            .await?;

        if updated.status != previous {
            self.notification_hub
                .publish(NotificationEvent::PaymentStatusChanged {
                    payment: updated.clone(),
                    previous,
                })
                .await;
        }

        Ok(updated)
    }

    async fn chargeable_state(&self, reference: ChargeableRef) -> Result<Option<ChargeableState>> {
        let state = match reference.kind {
            ChargeableKind::ServiceBooking => {
                self.booking_repo
                    .find_booking(reference.id)
                    .await?
                    .map(|b| ChargeableState {
                        cancelled: b.status.is_cancelled(),
                        settled: b.status.is_settled(),
                    })
            }
            ChargeableKind::PersonalAppointment => self
                .booking_repo
                .find_appointment(reference.id)
                .await?
                .map(|a| ChargeableState {
                    cancelled: a.status.is_cancelled(),
                    settled: a.status.is_settled(),
                }),
            ChargeableKind::PharmacyOrder => {
                self.order_repo
                    .find_order(reference.id)
                    .await?
                    .map(|o| ChargeableState {
                        cancelled: o.status.is_cancelled(),
                        settled: o.status.is_settled(),
                    })
            }
            ChargeableKind::EquipmentPurchase => self
                .order_repo
                .find_purchase(reference.id)
                .await?
                .map(|p| ChargeableState {
                    cancelled: p.status.is_cancelled(),
                    settled: p.status.is_settled(),
                }),
            ChargeableKind::EquipmentRental => {
                self.order_repo
                    .find_rental(reference.id)
                    .await?
                    .map(|r| ChargeableState {
                        cancelled: r.status.is_cancelled(),
                        settled: r.status.is_settled(),
                    })
            }
        };

        if state.is_none() {
            // Dangling link. Tolerated: the transition proceeds ungated
            // rather than blocking the user on a historic row.
            tracing::warn!(
                kind = reference.kind.as_str(),
                id = %reference.id,
                "payment links to a missing chargeable"
            );
        }

        Ok(state)
    }
}
