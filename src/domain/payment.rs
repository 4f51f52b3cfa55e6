use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry for a single monetary obligation. Created in the same
/// transaction as its chargeable, in `Unpaid` state, amount fixed to the
/// chargeable's total at that moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub chargeable: Option<ChargeableRef>,
    pub amount: Decimal,
    pub method: Option<PaymentMethod>,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub proof_url: Option<String>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tagged reference to the record that produced the obligation. A payment
/// carries at most one of these; linking to several chargeables at once is
/// structurally impossible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChargeableRef {
    pub kind: ChargeableKind,
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChargeableKind {
    ServiceBooking,
    PersonalAppointment,
    PharmacyOrder,
    EquipmentPurchase,
    EquipmentRental,
}

impl ChargeableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeableKind::ServiceBooking => "service_booking",
            ChargeableKind::PersonalAppointment => "personal_appointment",
            ChargeableKind::PharmacyOrder => "pharmacy_order",
            ChargeableKind::EquipmentPurchase => "equipment_purchase",
            ChargeableKind::EquipmentRental => "equipment_rental",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "service_booking" => Some(ChargeableKind::ServiceBooking),
            "personal_appointment" => Some(ChargeableKind::PersonalAppointment),
            "pharmacy_order" => Some(ChargeableKind::PharmacyOrder),
            "equipment_purchase" => Some(ChargeableKind::EquipmentPurchase),
            "equipment_rental" => Some(ChargeableKind::EquipmentRental),
            _ => None,
        }
    }
}

/// Once set, the method is locked; see `PaymentRepository::update`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Online => "online",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "online" => Some(PaymentMethod::Online),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Refunded,
    Partial,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Partial => "partial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            "partial" => Some(PaymentStatus::Partial),
            _ => None,
        }
    }
}

impl Payment {
    /// New unpaid ledger entry for a freshly created chargeable.
    pub fn new(
        user_id: Uuid,
        chargeable: ChargeableRef,
        amount: Decimal,
        method: Option<PaymentMethod>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            chargeable: Some(chargeable),
            amount,
            method,
            status: PaymentStatus::Unpaid,
            transaction_id: None,
            proof_url: None,
            verified_by: None,
            verified_at: None,
            paid_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Evidence of an online transfer: an uploaded screenshot or a bank
    /// transaction reference.
    pub fn has_proof(&self) -> bool {
        self.proof_url.as_deref().is_some_and(|s| !s.is_empty())
            || self.transaction_id.as_deref().is_some_and(|s| !s.is_empty())
    }
}
