use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    domain::{
        ChargeableKind, ChargeableRef, Payment, PaymentMethod, PaymentStatus,
        UserPaymentPreference,
    },
    error::{AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    user_id: String,
    chargeable_kind: Option<String>,
    chargeable_id: Option<String>,
    amount: String,
    method: Option<String>,
    status: String,
    transaction_id: Option<String>,
    proof_url: Option<String>,
    verified_by: Option<String>,
    verified_at: Option<NaiveDateTime>,
    paid_at: Option<NaiveDateTime>,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_uuid(s: &str) -> Result<Uuid> {
        Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
    }

    fn parse_amount(s: &str) -> Result<Decimal> {
        Decimal::from_str(s).map_err(|e| AppError::Database(format!("invalid amount: {}", e)))
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        let chargeable = match (row.chargeable_kind, row.chargeable_id) {
            (Some(kind), Some(id)) => Some(ChargeableRef {
                kind: ChargeableKind::parse(&kind).ok_or_else(|| {
                    AppError::Database(format!("Invalid chargeable kind: {}", kind))
                })?,
                id: Self::parse_uuid(&id)?,
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Database(
                    "Payment row has a partial chargeable link".to_string(),
                ))
            }
        };

        Ok(Payment {
            id: Self::parse_uuid(&row.id)?,
            user_id: Self::parse_uuid(&row.user_id)?,
            chargeable,
            amount: Self::parse_amount(&row.amount)?,
            method: row
                .method
                .as_deref()
                .map(|m| {
                    PaymentMethod::parse(m)
                        .ok_or_else(|| AppError::Database(format!("Invalid payment method: {}", m)))
                })
                .transpose()?,
            status: PaymentStatus::parse(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid payment status: {}", row.status)))?,
            transaction_id: row.transaction_id,
            proof_url: row.proof_url,
            verified_by: row.verified_by.as_deref().map(Self::parse_uuid).transpose()?,
            verified_at: row
                .verified_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            paid_at: row.paid_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            notes: row.notes,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, user_id, chargeable_kind, chargeable_id, amount, method,
           status, transaction_id, proof_url, verified_by, verified_at,
           paid_at, notes, created_at, updated_at
    FROM payments
"#;

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let now = Utc::now().naive_utc();

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
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(payment.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created payment".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{} WHERE id = ?", SELECT_PAYMENT))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{} WHERE user_id = ? ORDER BY created_at DESC",
            SELECT_PAYMENT
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn find_by_chargeable(&self, chargeable: ChargeableRef) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{} WHERE chargeable_kind = ? AND chargeable_id = ? ORDER BY created_at DESC",
            SELECT_PAYMENT
        ))
        .bind(chargeable.kind.as_str())
        .bind(chargeable.id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn update(
        &self,
        id: Uuid,
        payment: Payment,
        allow_method_change: bool,
    ) -> Result<Payment> {
        // Check-and-write under one transaction so a concurrent writer
        // cannot slip a method change past the lock.
        let mut tx = self.pool.begin().await?;

        let stored_method: Option<Option<String>> =
            sqlx::query_scalar("SELECT method FROM payments WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        let stored_method =
            stored_method.ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        // Save-time invariant: a chosen payment method never changes without
        // an explicit override asserted at the call site.
        if let Some(old_method) = stored_method.as_deref().and_then(PaymentMethod::parse) {
            if payment.method != Some(old_method) && !allow_method_change {
                return Err(AppError::Validation(
                    "Payment method is locked and cannot be changed once set".to_string(),
                ));
            }
        }

        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE payments
            SET method = ?,
                status = ?,
                transaction_id = ?,
                proof_url = ?,
                verified_by = ?,
                verified_at = ?,
                paid_at = ?,
                notes = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(payment.method.map(|m| m.as_str()))
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.proof_url)
        .bind(payment.verified_by.map(|v| v.to_string()))
        .bind(payment.verified_at.map(|dt| dt.naive_utc()))
        .bind(payment.paid_at.map(|dt| dt.naive_utc()))
        .bind(&payment.notes)
        .bind(now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated payment".to_string()))
    }

    async fn save_preference(
        &self,
        preference: UserPaymentPreference,
    ) -> Result<UserPaymentPreference> {
        // A new default displaces any previous one.
        if preference.is_default {
            sqlx::query("UPDATE user_payment_preferences SET is_default = 0 WHERE user_id = ?")
                .bind(preference.user_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        sqlx::query(
            r#"
            INSERT INTO user_payment_preferences (
                id, user_id, method, qr_code_url, bank_info, is_default, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(preference.id.to_string())
        .bind(preference.user_id.to_string())
        .bind(preference.method.as_str())
        .bind(&preference.qr_code_url)
        .bind(&preference.bank_info)
        .bind(preference.is_default)
        .bind(preference.created_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(preference)
    }

    async fn default_method_for(&self, user_id: Uuid) -> Result<Option<PaymentMethod>> {
        let method: Option<String> = sqlx::query_scalar(
            r#"
            SELECT method FROM user_payment_preferences
            WHERE user_id = ? AND is_default = 1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        method
            .as_deref()
            .map(|m| {
                PaymentMethod::parse(m)
                    .ok_or_else(|| AppError::Database(format!("Invalid payment method: {}", m)))
            })
            .transpose()
    }
}
