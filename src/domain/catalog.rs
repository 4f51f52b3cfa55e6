use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace service offered by providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_min: Decimal,
    pub price_max: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Price band check applied when a booking is created or re-priced.
    pub fn price_in_range(&self, price: Decimal) -> bool {
        price >= self.price_min && price <= self.price_max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub stock_quantity: i64,
    pub requires_prescription: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    pub name: String,
    pub rent_price_daily: Decimal,
    pub rent_price_weekly: Decimal,
    pub rent_price_monthly: Decimal,
    pub security_deposit: Decimal,
    pub purchase_price: Decimal,
    pub total_units: i64,
    pub available_units: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    pub fn is_available(&self) -> bool {
        self.is_active && self.available_units > 0
    }
}
