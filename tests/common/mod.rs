#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use uuid::Uuid;

use carelink::{
    domain::*,
    notifications::NotificationHub,
    repository::{CatalogRepository, UserRepository},
    service::ServiceContext,
};

pub async fn test_context() -> anyhow::Result<ServiceContext> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(ServiceContext::new(pool, Arc::new(NotificationHub::new())))
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub async fn create_user(ctx: &ServiceContext, username: &str, role: UserRole) -> User {
    ctx.user_repo
        .create(CreateUserRequest {
            username: username.to_string(),
            full_name: format!("{} Test", username),
            email: format!("{}@example.com", username),
            role,
        })
        .await
        .unwrap()
}

pub async fn sample_service(ctx: &ServiceContext, min: &str, max: &str) -> Service {
    let now = Utc::now();
    ctx.catalog_repo
        .create_service(Service {
            id: Uuid::new_v4(),
            name: "Home Nursing Visit".to_string(),
            description: None,
            price_min: dec(min),
            price_max: dec(max),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn sample_medicine(ctx: &ServiceContext, unit_price: &str, stock: i64) -> Medicine {
    let now = Utc::now();
    ctx.catalog_repo
        .create_medicine(Medicine {
            id: Uuid::new_v4(),
            name: "Paracetamol 500mg".to_string(),
            unit_price: dec(unit_price),
            stock_quantity: stock,
            requires_prescription: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn sample_equipment(ctx: &ServiceContext, units: i64) -> Equipment {
    let now = Utc::now();
    ctx.catalog_repo
        .create_equipment(Equipment {
            id: Uuid::new_v4(),
            name: "Wheelchair".to_string(),
            rent_price_daily: dec("150.00"),
            rent_price_weekly: dec("350.00"),
            rent_price_monthly: dec("1200.00"),
            security_deposit: dec("100.00"),
            purchase_price: dec("5000.00"),
            total_units: units,
            available_units: units,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}
