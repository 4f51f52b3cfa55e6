use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{ChargeableKind, ChargeableRef},
    error::Result,
    ledger::{self, Balance, ChargeSummary, PaymentBuckets},
    repository::{BookingRepository, OrderRepository, PaymentRepository},
};

/// A user's balance plus the classified payment sets behind it.
#[derive(Debug)]
pub struct Statement {
    pub balance: Balance,
    pub buckets: PaymentBuckets,
}

/// The only place a balance is computed. Every caller — dashboard summary,
/// balance detail page, payment listings — goes through this service, so
/// the figures cannot drift apart.
pub struct BalanceService {
    booking_repo: Arc<dyn BookingRepository>,
    order_repo: Arc<dyn OrderRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
}

impl BalanceService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        order_repo: Arc<dyn OrderRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            booking_repo,
            order_repo,
            payment_repo,
        }
    }

    /// Read-only and idempotent: two calls with no intervening writes
    /// return identical figures.
    pub async fn balance_for(&self, user_id: Uuid) -> Result<Balance> {
        Ok(self.statement_for(user_id).await?.balance)
    }

    pub async fn statement_for(&self, user_id: Uuid) -> Result<Statement> {
        let (charges, cancelled) = self.collect_charges(user_id).await?;
        let gross = ledger::gross_total(&charges);

        let payments = self.payment_repo.find_by_user(user_id).await?;
        let buckets = PaymentBuckets::classify(payments, |payment| {
            payment
                .chargeable
                .map(|c| cancelled.contains(&c))
                .unwrap_or(false)
        });

        Ok(Statement {
            balance: Balance::compose(gross, &buckets),
            buckets,
        })
    }

    /// One pass over all five chargeable kinds: the summaries the
    /// aggregator sums, and the set of cancelled chargeables used to void
    /// their payments out of the classifier.
    async fn collect_charges(
        &self,
        user_id: Uuid,
    ) -> Result<(Vec<ChargeSummary>, HashSet<ChargeableRef>)> {
        let mut charges = Vec::new();
        let mut cancelled = HashSet::new();

        for booking in self.booking_repo.list_bookings_for_patient(user_id).await? {
            let reference = ChargeableRef {
                kind: ChargeableKind::ServiceBooking,
                id: booking.id,
            };
            if booking.status.is_cancelled() {
                cancelled.insert(reference);
            }
            charges.push(ChargeSummary {
                kind: reference.kind,
                id: reference.id,
                total_amount: Some(booking.total_amount),
                cancelled: booking.status.is_cancelled(),
            });
        }

        for appointment in self
            .booking_repo
            .list_appointments_for_patient(user_id)
            .await?
        {
            let reference = ChargeableRef {
                kind: ChargeableKind::PersonalAppointment,
                id: appointment.id,
            };
            if appointment.status.is_cancelled() {
                cancelled.insert(reference);
            }
            charges.push(ChargeSummary {
                kind: reference.kind,
                id: reference.id,
                total_amount: Some(appointment.total_fee),
                cancelled: appointment.status.is_cancelled(),
            });
        }

        for order in self.order_repo.list_orders_for_customer(user_id).await? {
            let reference = ChargeableRef {
                kind: ChargeableKind::PharmacyOrder,
                id: order.id,
            };
            if order.status.is_cancelled() {
                cancelled.insert(reference);
            }
            charges.push(ChargeSummary {
                kind: reference.kind,
                id: reference.id,
                total_amount: Some(order.total_amount),
                cancelled: order.status.is_cancelled(),
            });
        }

        for purchase in self.order_repo.list_purchases_for_customer(user_id).await? {
            let reference = ChargeableRef {
                kind: ChargeableKind::EquipmentPurchase,
                id: purchase.id,
            };
            if purchase.status.is_cancelled() {
                cancelled.insert(reference);
            }
            charges.push(ChargeSummary {
                kind: reference.kind,
                id: reference.id,
                total_amount: Some(purchase.total_amount),
                cancelled: purchase.status.is_cancelled(),
            });
        }

        for rental in self.order_repo.list_rentals_for_customer(user_id).await? {
            let reference = ChargeableRef {
                kind: ChargeableKind::EquipmentRental,
                id: rental.id,
            };
            if rental.status.is_cancelled() {
                cancelled.insert(reference);
            }
            charges.push(ChargeSummary {
                kind: reference.kind,
                id: reference.id,
                total_amount: Some(rental.total_amount),
                cancelled: rental.status.is_cancelled(),
            });
        }

        Ok((charges, cancelled))
    }
}
