//! Pagos y depósitos de garantía

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del pago - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Estado del depósito - mapea al ENUM deposit_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "deposit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Held,
    Released,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deposit {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub status: DepositStatus,
    pub updated_at: DateTime<Utc>,
}
