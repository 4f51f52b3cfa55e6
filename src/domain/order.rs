use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pharmacy order. Stock is decremented in the same transaction that
/// creates the order and its payment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacyOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub medicine_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub delivery_charge: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "out_for_delivery" => Some(OrderStatus::OutForDelivery),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl PharmacyOrder {
    pub fn compute_subtotal(unit_price: Decimal, quantity: i64) -> Decimal {
        unit_price * Decimal::from(quantity)
    }

    pub fn compute_total(subtotal: Decimal, delivery_charge: Decimal) -> Decimal {
        subtotal + delivery_charge
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentPurchase {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub equipment_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub delivery_charge: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub status: PurchaseStatus,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Confirmed => "confirmed",
            PurchaseStatus::Shipped => "shipped",
            PurchaseStatus::Delivered => "delivered",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PurchaseStatus::Pending),
            "confirmed" => Some(PurchaseStatus::Confirmed),
            "shipped" => Some(PurchaseStatus::Shipped),
            "delivered" => Some(PurchaseStatus::Delivered),
            "cancelled" => Some(PurchaseStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PurchaseStatus::Cancelled)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, PurchaseStatus::Delivered)
    }
}

impl EquipmentPurchase {
    pub fn compute_subtotal(unit_price: Decimal, quantity: i64) -> Decimal {
        unit_price * Decimal::from(quantity)
    }

    pub fn compute_total(subtotal: Decimal, delivery_charge: Decimal, discount: Decimal) -> Decimal {
        subtotal + delivery_charge - discount
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentRental {
    pub id: Uuid,
    pub rental_number: String,
    pub customer_id: Uuid,
    pub equipment_id: Uuid,
    pub rental_period: RentalPeriod,
    pub quantity: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rental_price: Decimal,
    pub security_deposit: Decimal,
    pub delivery_charge: Decimal,
    pub late_fee: Decimal,
    pub damage_charge: Decimal,
    pub total_amount: Decimal,
    pub status: RentalStatus,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub actual_return_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RentalPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl RentalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalPeriod::Daily => "daily",
            RentalPeriod::Weekly => "weekly",
            RentalPeriod::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(RentalPeriod::Daily),
            "weekly" => Some(RentalPeriod::Weekly),
            "monthly" => Some(RentalPeriod::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    Pending,
    Confirmed,
    Active,
    Returned,
    Cancelled,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Confirmed => "confirmed",
            RentalStatus::Active => "active",
            RentalStatus::Returned => "returned",
            RentalStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RentalStatus::Pending),
            "confirmed" => Some(RentalStatus::Confirmed),
            "active" => Some(RentalStatus::Active),
            "returned" => Some(RentalStatus::Returned),
            "cancelled" => Some(RentalStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RentalStatus::Cancelled)
    }

    /// Cash can be confirmed once the rental is out with the customer or back.
    pub fn is_settled(&self) -> bool {
        matches!(self, RentalStatus::Active | RentalStatus::Returned)
    }
}

impl EquipmentRental {
    pub fn compute_total(
        rental_price: Decimal,
        security_deposit: Decimal,
        delivery_charge: Decimal,
        late_fee: Decimal,
        damage_charge: Decimal,
    ) -> Decimal {
        rental_price + security_deposit + delivery_charge + late_fee + damage_charge
    }

    pub fn rental_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: Uuid,
    pub medicine_id: Uuid,
    pub quantity: i64,
    pub delivery_address: String,
    pub delivery_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseEquipmentRequest {
    pub customer_id: Uuid,
    pub equipment_id: Uuid,
    pub quantity: i64,
    #[serde(default)]
    pub discount: Decimal,
    pub delivery_address: String,
    pub delivery_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentEquipmentRequest {
    pub customer_id: Uuid,
    pub equipment_id: Uuid,
    pub rental_period: RentalPeriod,
    pub quantity: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub delivery_address: String,
    pub delivery_phone: String,
}
