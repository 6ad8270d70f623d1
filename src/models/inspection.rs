//! Inspecciones del vehículo: walkaround, checklist de preparación y fotos de estado
//!
//! Cada registro pertenece a una funcionalidad distinta del back office; aquí
//! solo se modelan para leerlos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Walkaround: revisión del personal más conformidad del cliente
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WalkaroundInspection {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub inspection_complete: bool,
    pub customer_acknowledged: bool,
    pub inspected_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Checklist de preparación del vehículo
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehiclePrepChecklist {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Ángulo de una foto de estado - mapea al ENUM photo_angle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "photo_angle", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PhotoAngle {
    Front,
    Rear,
    Left,
    Right,
    Interior,
    Odometer,
}

impl PhotoAngle {
    /// Ángulos que deben estar fotografiados antes de la entrega
    pub const REQUIRED: [PhotoAngle; 6] = [
        PhotoAngle::Front,
        PhotoAngle::Rear,
        PhotoAngle::Left,
        PhotoAngle::Right,
        PhotoAngle::Interior,
        PhotoAngle::Odometer,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConditionPhoto {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub angle: PhotoAngle,
    pub storage_path: String,
    pub taken_at: DateTime<Utc>,
}

/// Todas las vistas requeridas tienen al menos una foto
pub fn condition_photos_complete(photos: &[ConditionPhoto]) -> bool {
    PhotoAngle::REQUIRED
        .iter()
        .all(|angle| photos.iter().any(|p| p.angle == *angle))
}
