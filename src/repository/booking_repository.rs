use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    domain::{
        AppointmentStatus, AppointmentType, BookingStatus, LocationType, PersonalAppointment,
        ServiceBooking,
    },
    error::{AppError, Result},
    repository::BookingRepository,
};

#[derive(FromRow)]
struct BookingRow {
    id: String,
    patient_id: String,
    provider_id: Option<String>,
    service_id: String,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    service_address: String,
    service_price: String,
    additional_charges: String,
    final_price: Option<String>,
    total_amount: String,
    status: String,
    patient_notes: Option<String>,
    cancellation_reason: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct AppointmentRow {
    id: String,
    patient_id: String,
    provider_id: String,
    appointment_type: String,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    duration_minutes: i64,
    location_type: String,
    reason: String,
    consultation_fee: String,
    additional_charges: String,
    total_fee: String,
    status: String,
    cancellation_reason: Option<String>,
    cancelled_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
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

fn row_to_booking(row: BookingRow) -> Result<ServiceBooking> {
    Ok(ServiceBooking {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        provider_id: row.provider_id.as_deref().map(parse_uuid).transpose()?,
        service_id: parse_uuid(&row.service_id)?,
        appointment_date: row.appointment_date,
        appointment_time: row.appointment_time,
        service_address: row.service_address,
        service_price: parse_amount(&row.service_price)?,
        additional_charges: parse_amount(&row.additional_charges)?,
        final_price: row.final_price.as_deref().map(parse_amount).transpose()?,
        total_amount: parse_amount(&row.total_amount)?,
        status: BookingStatus::parse(&row.status)
            .ok_or_else(|| AppError::Database(format!("Invalid booking status: {}", row.status)))?,
        patient_notes: row.patient_notes,
        cancellation_reason: row.cancellation_reason,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

fn row_to_appointment(row: AppointmentRow) -> Result<PersonalAppointment> {
    Ok(PersonalAppointment {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        provider_id: parse_uuid(&row.provider_id)?,
        appointment_type: AppointmentType::parse(&row.appointment_type).ok_or_else(|| {
            AppError::Database(format!("Invalid appointment type: {}", row.appointment_type))
        })?,
        appointment_date: row.appointment_date,
        appointment_time: row.appointment_time,
        duration_minutes: row.duration_minutes,
        location_type: LocationType::parse(&row.location_type).ok_or_else(|| {
            AppError::Database(format!("Invalid location type: {}", row.location_type))
        })?,
        reason: row.reason,
        consultation_fee: parse_amount(&row.consultation_fee)?,
        additional_charges: parse_amount(&row.additional_charges)?,
        total_fee: parse_amount(&row.total_fee)?,
        status: AppointmentStatus::parse(&row.status).ok_or_else(|| {
            AppError::Database(format!("Invalid appointment status: {}", row.status))
        })?,
        cancellation_reason: row.cancellation_reason,
        cancelled_at: row.cancelled_at.map(utc),
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

const SELECT_BOOKING: &str = r#"
    SELECT id, patient_id, provider_id, service_id, appointment_date,
           appointment_time, service_address, service_price, additional_charges,
           final_price, total_amount, status, patient_notes,
           cancellation_reason, created_at, updated_at
    FROM service_bookings
"#;

const SELECT_APPOINTMENT: &str = r#"
    SELECT id, patient_id, provider_id, appointment_type, appointment_date,
           appointment_time, duration_minutes, location_type, reason,
           consultation_fee, additional_charges, total_fee, status,
           cancellation_reason, cancelled_at, created_at, updated_at
    FROM personal_appointments
"#;

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn find_booking(&self, id: Uuid) -> Result<Option<ServiceBooking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("{} WHERE id = ?", SELECT_BOOKING))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn list_bookings_for_patient(&self, patient_id: Uuid) -> Result<Vec<ServiceBooking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{} WHERE patient_id = ? ORDER BY created_at DESC",
            SELECT_BOOKING
        ))
        .bind(patient_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> Result<ServiceBooking> {
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE service_bookings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_booking(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Service booking not found".to_string()))
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<PersonalAppointment>> {
        let row =
            sqlx::query_as::<_, AppointmentRow>(&format!("{} WHERE id = ?", SELECT_APPOINTMENT))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(row_to_appointment(r)?)),
            None => Ok(None),
        }
    }

    async fn list_appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<PersonalAppointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "{} WHERE patient_id = ? ORDER BY created_at DESC",
            SELECT_APPOINTMENT
        ))
        .bind(patient_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_appointment).collect()
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<PersonalAppointment> {
        let now = Utc::now().naive_utc();
        let cancelled_at = status.is_cancelled().then_some(now);

        sqlx::query(
            r#"
            UPDATE personal_appointments
            SET status = ?, cancelled_at = COALESCE(?, cancelled_at), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(cancelled_at)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_appointment(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Personal appointment not found".to_string()))
    }
}
