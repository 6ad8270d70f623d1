//! Contrato de alquiler (uno por reserva)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del contrato - mapea al ENUM agreement_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "agreement_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgreementStatus {
    Draft,
    Generated,
    Signed,
    Confirmed,
}

impl AgreementStatus {
    /// El cliente ya firmó (confirmed implica firmado)
    pub fn is_signed(&self) -> bool {
        matches!(self, AgreementStatus::Signed | AgreementStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RentalAgreement {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: AgreementStatus,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
