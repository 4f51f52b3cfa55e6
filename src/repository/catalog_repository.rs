use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    domain::{Equipment, Medicine, Service},
    error::{AppError, Result},
    repository::CatalogRepository,
};

#[derive(FromRow)]
struct ServiceRow {
    id: String,
    name: String,
    description: Option<String>,
    price_min: String,
    price_max: String,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct MedicineRow {
    id: String,
    name: String,
    unit_price: String,
    stock_quantity: i64,
    requires_prescription: bool,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct EquipmentRow {
    id: String,
    name: String,
    rent_price_daily: String,
    rent_price_weekly: String,
    rent_price_monthly: String,
    security_deposit: String,
    purchase_price: String,
    total_units: i64,
    available_units: i64,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
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

fn row_to_service(row: ServiceRow) -> Result<Service> {
    Ok(Service {
        id: parse_uuid(&row.id)?,
        name: row.name,
        description: row.description,
        price_min: parse_amount(&row.price_min)?,
        price_max: parse_amount(&row.price_max)?,
        is_active: row.is_active,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

fn row_to_medicine(row: MedicineRow) -> Result<Medicine> {
    Ok(Medicine {
        id: parse_uuid(&row.id)?,
        name: row.name,
        unit_price: parse_amount(&row.unit_price)?,
        stock_quantity: row.stock_quantity,
        requires_prescription: row.requires_prescription,
        is_active: row.is_active,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

fn row_to_equipment(row: EquipmentRow) -> Result<Equipment> {
    Ok(Equipment {
        id: parse_uuid(&row.id)?,
        name: row.name,
        rent_price_daily: parse_amount(&row.rent_price_daily)?,
        rent_price_weekly: parse_amount(&row.rent_price_weekly)?,
        rent_price_monthly: parse_amount(&row.rent_price_monthly)?,
        security_deposit: parse_amount(&row.security_deposit)?,
        purchase_price: parse_amount(&row.purchase_price)?,
        total_units: row.total_units,
        available_units: row.available_units,
        is_active: row.is_active,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn create_service(&self, service: Service) -> Result<Service> {
        sqlx::query(
            r#"
            INSERT INTO services (id, name, description, price_min, price_max,
                                  is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(service.id.to_string())
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_min.to_string())
        .bind(service.price_max.to_string())
        .bind(service.is_active)
        .bind(service.created_at.naive_utc())
        .bind(service.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(service)
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT id, name, description, price_min, price_max, is_active,
                   created_at, updated_at
            FROM services WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(row_to_service(r)?)),
            None => Ok(None),
        }
    }

    async fn create_medicine(&self, medicine: Medicine) -> Result<Medicine> {
        sqlx::query(
            r#"
            INSERT INTO medicines (id, name, unit_price, stock_quantity,
                                   requires_prescription, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(medicine.id.to_string())
        .bind(&medicine.name)
        .bind(medicine.unit_price.to_string())
        .bind(medicine.stock_quantity)
        .bind(medicine.requires_prescription)
        .bind(medicine.is_active)
        .bind(medicine.created_at.naive_utc())
        .bind(medicine.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(medicine)
    }

    async fn find_medicine(&self, id: Uuid) -> Result<Option<Medicine>> {
        let row = sqlx::query_as::<_, MedicineRow>(
            r#"
            SELECT id, name, unit_price, stock_quantity, requires_prescription,
                   is_active, created_at, updated_at
            FROM medicines WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(row_to_medicine(r)?)),
            None => Ok(None),
        }
    }

    async fn create_equipment(&self, equipment: Equipment) -> Result<Equipment> {
        sqlx::query(
            r#"
            INSERT INTO equipment (id, name, rent_price_daily, rent_price_weekly,
                                   rent_price_monthly, security_deposit, purchase_price,
                                   total_units, available_units, is_active,
                                   created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(equipment.id.to_string())
        .bind(&equipment.name)
        .bind(equipment.rent_price_daily.to_string())
        .bind(equipment.rent_price_weekly.to_string())
        .bind(equipment.rent_price_monthly.to_string())
        .bind(equipment.security_deposit.to_string())
        .bind(equipment.purchase_price.to_string())
        .bind(equipment.total_units)
        .bind(equipment.available_units)
        .bind(equipment.is_active)
        .bind(equipment.created_at.naive_utc())
        .bind(equipment.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(equipment)
    }

    async fn find_equipment(&self, id: Uuid) -> Result<Option<Equipment>> {
        let row = sqlx::query_as::<_, EquipmentRow>(
            r#"
            SELECT id, name, rent_price_daily, rent_price_weekly, rent_price_monthly,
                   security_deposit, purchase_price, total_units, available_units,
                   is_active, created_at, updated_at
            FROM equipment WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(row_to_equipment(r)?)),
            None => Ok(None),
        }
    }
}
