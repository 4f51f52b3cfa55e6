use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{ChargeableRef, Payment, PaymentStatus};
use crate::error::Result;

/// Events the payment and order flows publish. Delivery transports (email,
/// SMS) are out of scope; implementations decide what to do with these.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    OrderPlaced {
        user_id: uuid::Uuid,
        chargeable: ChargeableRef,
        reference: String,
    },
    OrderCancelled {
        user_id: uuid::Uuid,
        chargeable: ChargeableRef,
    },
    PaymentStatusChanged {
        payment: Payment,
        previous: PaymentStatus,
    },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    async fn handle_event(&self, event: &NotificationEvent) -> Result<()>;
}

/// Fans events out to every registered notifier. A failing notifier is
/// logged and skipped; it never fails the request that raised the event.
pub struct NotificationHub {
    notifiers: RwLock<Vec<Arc<dyn Notifier>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            notifiers: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, notifier: Arc<dyn Notifier>) {
        if notifier.is_enabled() {
            let mut notifiers = self.notifiers.write().await;
            tracing::info!("Registered notifier: {}", notifier.name());
            notifiers.push(notifier);
        }
    }

    pub async fn publish(&self, event: NotificationEvent) {
        let notifiers = self.notifiers.read().await;

        for notifier in notifiers.iter() {
            if !notifier.is_enabled() {
                continue;
            }

            if let Err(e) = notifier.handle_event(&event).await {
                tracing::error!(
                    "Notifier {} failed to handle event: {:?}",
                    notifier.name(),
                    e
                );
            }
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Default notifier: writes the event to the log. Stands in for the real
/// dispatch channels in development and tests.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn handle_event(&self, event: &NotificationEvent) -> Result<()> {
        match event {
            NotificationEvent::OrderPlaced {
                user_id, reference, ..
            } => {
                tracing::info!(user = %user_id, reference, "order placed");
            }
            NotificationEvent::OrderCancelled { user_id, chargeable } => {
                tracing::info!(user = %user_id, kind = chargeable.kind.as_str(), "order cancelled");
            }
            NotificationEvent::PaymentStatusChanged { payment, previous } => {
                tracing::info!(
                    payment = %payment.id,
                    from = previous.as_str(),
                    to = payment.status.as_str(),
                    amount = %payment.amount,
                    "payment status changed"
                );
            }
        }
        Ok(())
    }
}
