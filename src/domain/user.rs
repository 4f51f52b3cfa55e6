use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::PaymentMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Patient,
    Provider,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Patient => "patient",
            UserRole::Provider => "provider",
            UserRole::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "patient" => Some(UserRole::Patient),
            "provider" => Some(UserRole::Provider),
            "staff" => Some(UserRole::Staff),
            _ => None,
        }
    }
}

impl User {
    pub fn is_staff(&self) -> bool {
        self.role == UserRole::Staff
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
}

/// Stored payment preference, used only to pre-fill `Payment.method` at
/// checkout time. Choosing a method on an existing payment still locks it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPaymentPreference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub method: PaymentMethod,
    pub qr_code_url: Option<String>,
    pub bank_info: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}
