//! Documentos de verificación de identidad
//!
//! Cada reserva tiene como máximo un documento por tipo (anverso y reverso
//! del permiso de conducir), cada uno con su propio estado de aprobación.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tipo de documento - mapea al ENUM document_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "document_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    LicenseFront,
    LicenseBack,
}

/// Estado de revisión - mapea al ENUM verification_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VerificationDocument {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub document_type: DocumentType,
    pub status: VerificationStatus,
    pub storage_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
