pub mod balance_service;
pub mod checkout_service;
pub mod payment_service;

use std::sync::Arc;
use sqlx::SqlitePool;

use crate::notifications::NotificationHub;
use crate::repository::*;

pub use balance_service::{BalanceService, Statement};
pub use checkout_service::CheckoutService;
pub use payment_service::PaymentService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub catalog_repo: Arc<dyn CatalogRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub order_repo: Arc<dyn OrderRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub notification_hub: Arc<NotificationHub>,
    pub balance_service: Arc<BalanceService>,
    pub payment_service: Arc<PaymentService>,
    pub checkout_service: Arc<CheckoutService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, notification_hub: Arc<NotificationHub>) -> Self {
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let catalog_repo: Arc<dyn CatalogRepository> =
            Arc::new(SqliteCatalogRepository::new(db_pool.clone()));
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let order_repo: Arc<dyn OrderRepository> =
            Arc::new(SqliteOrderRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));

        let balance_service = Arc::new(BalanceService::new(
            booking_repo.clone(),
            order_repo.clone(),
            payment_repo.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            payment_repo.clone(),
            booking_repo.clone(),
            order_repo.clone(),
            notification_hub.clone(),
        ));
        let checkout_service = Arc::new(CheckoutService::new(
            db_pool.clone(),
            catalog_repo.clone(),
            booking_repo.clone(),
            order_repo.clone(),
            payment_repo.clone(),
            notification_hub.clone(),
        ));

        Self {
            user_repo,
            catalog_repo,
            booking_repo,
            order_repo,
            payment_repo,
            notification_hub,
            balance_service,
            payment_service,
            checkout_service,
            db_pool,
        }
    }
}
