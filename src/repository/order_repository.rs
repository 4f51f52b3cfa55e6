use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    domain::{
        EquipmentPurchase, EquipmentRental, OrderStatus, PharmacyOrder, PurchaseStatus,
        RentalPeriod, RentalStatus,
    },
    error::{AppError, Result},
    repository::OrderRepository,
};

#[derive(FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    customer_id: String,
    medicine_id: String,
    quantity: i64,
    unit_price: String,
    subtotal: String,
    delivery_charge: String,
    total_amount: String,
    status: String,
    delivery_address: String,
    delivery_phone: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct PurchaseRow {
    id: String,
    order_number: String,
    customer_id: String,
    equipment_id: String,
    quantity: i64,
    unit_price: String,
    subtotal: String,
    delivery_charge: String,
    discount: String,
    total_amount: String,
    status: String,
    delivery_address: String,
    delivery_phone: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct RentalRow {
    id: String,
    rental_number: String,
    customer_id: String,
    equipment_id: String,
    rental_period: String,
    quantity: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    rental_price: String,
    security_deposit: String,
    delivery_charge: String,
    late_fee: String,
    damage_charge: String,
    total_amount: String,
    status: String,
    delivery_address: String,
    delivery_phone: String,
    actual_return_date: Option<NaiveDate>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
}

fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| AppError::Database(format!("invalid amount: {}", e)))
}

fn utc(dt: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(dt, Utc)
}

fn row_to_order(row: OrderRow) -> Result<PharmacyOrder> {
    Ok(PharmacyOrder {
        id: parse_uuid(&row.id)?,
        order_number: row.order_number,
        customer_id: parse_uuid(&row.customer_id)?,
        medicine_id: parse_uuid(&row.medicine_id)?,
        quantity: row.quantity,
        unit_price: parse_amount(&row.unit_price)?,
        subtotal: parse_amount(&row.subtotal)?,
        delivery_charge: parse_amount(&row.delivery_charge)?,
        total_amount: parse_amount(&row.total_amount)?,
        status: OrderStatus::parse(&row.status)
            .ok_or_else(|| AppError::Database(format!("Invalid order status: {}", row.status)))?,
        delivery_address: row.delivery_address,
        delivery_phone: row.delivery_phone,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

fn row_to_purchase(row: PurchaseRow) -> Result<EquipmentPurchase> {
    Ok(EquipmentPurchase {
        id: parse_uuid(&row.id)?,
        order_number: row.order_number,
        customer_id: parse_uuid(&row.customer_id)?,
        equipment_id: parse_uuid(&row.equipment_id)?,
        quantity: row.quantity,
        unit_price: parse_amount(&row.unit_price)?,
        subtotal: parse_amount(&row.subtotal)?,
        delivery_charge: parse_amount(&row.delivery_charge)?,
        discount: parse_amount(&row.discount)?,
        total_amount: parse_amount(&row.total_amount)?,
        status: PurchaseStatus::parse(&row.status)
            .ok_or_else(|| AppError::Database(format!("Invalid purchase status: {}", row.status)))?,
        delivery_address: row.delivery_address,
        delivery_phone: row.delivery_phone,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

fn row_to_rental(row: RentalRow) -> Result<EquipmentRental> {
    Ok(EquipmentRental {
        id: parse_uuid(&row.id)?,
        rental_number: row.rental_number,
        customer_id: parse_uuid(&row.customer_id)?,
        equipment_id: parse_uuid(&row.equipment_id)?,
        rental_period: RentalPeriod::parse(&row.rental_period).ok_or_else(|| {
            AppError::Database(format!("Invalid rental period: {}", row.rental_period))
        })?,
        quantity: row.quantity,
        start_date: row.start_date,
        end_date: row.end_date,
        rental_price: parse_amount(&row.rental_price)?,
        security_deposit: parse_amount(&row.security_deposit)?,
        delivery_charge: parse_amount(&row.delivery_charge)?,
        late_fee: parse_amount(&row.late_fee)?,
        damage_charge: parse_amount(&row.damage_charge)?,
        total_amount: parse_amount(&row.total_amount)?,
        status: RentalStatus::parse(&row.status)
            .ok_or_else(|| AppError::Database(format!("Invalid rental status: {}", row.status)))?,
        delivery_address: row.delivery_address,
        delivery_phone: row.delivery_phone,
        actual_return_date: row.actual_return_date,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

const SELECT_ORDER: &str = r#"
    SELECT id, order_number, customer_id, medicine_id, quantity, unit_price,
           subtotal, delivery_charge, total_amount, status, delivery_address,
           delivery_phone, created_at, updated_at
    FROM pharmacy_orders
"#;

const SELECT_PURCHASE: &str = r#"
    SELECT id, order_number, customer_id, equipment_id, quantity, unit_price,
           subtotal, delivery_charge, discount, total_amount, status,
           delivery_address, delivery_phone, created_at, updated_at
    FROM equipment_purchases
"#;

const SELECT_RENTAL: &str = r#"
    SELECT id, rental_number, customer_id, equipment_id, rental_period,
           quantity, start_date, end_date, rental_price, security_deposit,
           delivery_charge, late_fee, damage_charge, total_amount, status,
           delivery_address, delivery_phone, actual_return_date,
           created_at, updated_at
    FROM equipment_rentals
"#;

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn find_order(&self, id: Uuid) -> Result<Option<PharmacyOrder>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = ?", SELECT_ORDER))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(row_to_order(r)?)),
            None => Ok(None),
        }
    }

    async fn list_orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<PharmacyOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{} WHERE customer_id = ? ORDER BY created_at DESC",
            SELECT_ORDER
        ))
        .bind(customer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<PharmacyOrder> {
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE pharmacy_orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Pharmacy order not found".to_string()))
    }

    async fn find_purchase(&self, id: Uuid) -> Result<Option<EquipmentPurchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!("{} WHERE id = ?", SELECT_PURCHASE))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(row_to_purchase(r)?)),
            None => Ok(None),
        }
    }

    async fn list_purchases_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<EquipmentPurchase>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            "{} WHERE customer_id = ? ORDER BY created_at DESC",
            SELECT_PURCHASE
        ))
        .bind(customer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_purchase).collect()
    }

    async fn update_purchase_status(
        &self,
        id: Uuid,
        status: PurchaseStatus,
    ) -> Result<EquipmentPurchase> {
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE equipment_purchases SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_purchase(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Equipment purchase not found".to_string()))
    }

    async fn find_rental(&self, id: Uuid) -> Result<Option<EquipmentRental>> {
        let row = sqlx::query_as::<_, RentalRow>(&format!("{} WHERE id = ?", SELECT_RENTAL))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(row_to_rental(r)?)),
            None => Ok(None),
        }
    }

    async fn list_rentals_for_customer(&self, customer_id: Uuid) -> Result<Vec<EquipmentRental>> {
        let rows = sqlx::query_as::<_, RentalRow>(&format!(
            "{} WHERE customer_id = ? ORDER BY created_at DESC",
            SELECT_RENTAL
        ))
        .bind(customer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_rental).collect()
    }

    async fn update_rental_status(&self, id: Uuid, status: RentalStatus) -> Result<EquipmentRental> {
        let now = Utc::now().naive_utc();
        let returned_on = matches!(status, RentalStatus::Returned).then(|| now.date());

        sqlx::query(
            r#"
            UPDATE equipment_rentals
            SET status = ?, actual_return_date = COALESCE(?, actual_return_date), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(returned_on)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_rental(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Equipment rental not found".to_string()))
    }
}
