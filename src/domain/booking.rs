use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace service booking: a patient books a catalogued service,
/// optionally assigned to a provider later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBooking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub service_address: String,
    pub service_price: Decimal,
    pub additional_charges: Decimal,
    /// Final price set after assessment; overrides `service_price` in totals.
    pub final_price: Option<Decimal>,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    pub patient_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "rejected" => Some(BookingStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BookingStatus::Cancelled)
    }

    /// Cash self-confirmation is gated on service delivery.
    pub fn is_settled(&self) -> bool {
        matches!(self, BookingStatus::Completed)
    }
}

impl ServiceBooking {
    /// Totals are always derived from the parts, never stored independently.
    pub fn compute_total(service_price: Decimal, final_price: Option<Decimal>, additional_charges: Decimal) -> Decimal {
        final_price.unwrap_or(service_price) + additional_charges
    }
}

/// Direct patient-provider appointment, separate from marketplace bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalAppointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration_minutes: i64,
    pub location_type: LocationType,
    pub reason: String,
    pub consultation_fee: Decimal,
    pub additional_charges: Decimal,
    pub total_fee: Decimal,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    Emergency,
    Screening,
    Counseling,
}

impl AppointmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "consultation",
            AppointmentType::FollowUp => "follow_up",
            AppointmentType::Emergency => "emergency",
            AppointmentType::Screening => "screening",
            AppointmentType::Counseling => "counseling",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consultation" => Some(AppointmentType::Consultation),
            "follow_up" => Some(AppointmentType::FollowUp),
            "emergency" => Some(AppointmentType::Emergency),
            "screening" => Some(AppointmentType::Screening),
            "counseling" => Some(AppointmentType::Counseling),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Video,
    Phone,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Video => "video",
            LocationType::Phone => "phone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(LocationType::Video),
            "phone" => Some(LocationType::Phone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    CancelledByPatient,
    CancelledByProvider,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::CancelledByPatient => "cancelled_by_patient",
            AppointmentStatus::CancelledByProvider => "cancelled_by_provider",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "in_progress" => Some(AppointmentStatus::InProgress),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled_by_patient" => Some(AppointmentStatus::CancelledByPatient),
            "cancelled_by_provider" => Some(AppointmentStatus::CancelledByProvider),
            "no_show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::CancelledByPatient | AppointmentStatus::CancelledByProvider
        )
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, AppointmentStatus::Completed)
    }
}

impl PersonalAppointment {
    pub fn compute_total(consultation_fee: Decimal, additional_charges: Decimal) -> Decimal {
        consultation_fee + additional_charges
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookServiceRequest {
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub service_address: String,
    pub service_price: Decimal,
    #[serde(default)]
    pub additional_charges: Decimal,
    pub patient_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration_minutes: i64,
    pub location_type: LocationType,
    pub reason: String,
    pub consultation_fee: Decimal,
    #[serde(default)]
    pub additional_charges: Decimal,
}
