//! Devolución del vehículo
//!
//! La devolución avanza por una secuencia fija de etapas; cada etapa tiene un
//! porcentaje de progreso asociado.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Etapa de la devolución - mapea al ENUM return_stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(type_name = "return_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReturnStage {
    NotStarted,
    VehicleReceived,
    Inspected,
    DamageAssessed,
    ChargesCalculated,
    Settled,
}

impl ReturnStage {
    pub const ALL: [ReturnStage; 6] = [
        ReturnStage::NotStarted,
        ReturnStage::VehicleReceived,
        ReturnStage::Inspected,
        ReturnStage::DamageAssessed,
        ReturnStage::ChargesCalculated,
        ReturnStage::Settled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStage::NotStarted => "not_started",
            ReturnStage::VehicleReceived => "vehicle_received",
            ReturnStage::Inspected => "inspected",
            ReturnStage::DamageAssessed => "damage_assessed",
            ReturnStage::ChargesCalculated => "charges_calculated",
            ReturnStage::Settled => "settled",
        }
    }

    /// Porcentaje de progreso mostrado para la etapa
    pub fn progress_percent(&self) -> u8 {
        match self {
            ReturnStage::NotStarted => 0,
            ReturnStage::VehicleReceived => 20,
            ReturnStage::Inspected => 40,
            ReturnStage::DamageAssessed => 60,
            ReturnStage::ChargesCalculated => 80,
            ReturnStage::Settled => 100,
        }
    }

    pub fn next(&self) -> Option<ReturnStage> {
        let index = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(index + 1).copied()
    }

    pub fn is_settled(&self) -> bool {
        *self == ReturnStage::Settled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReturnRecord {
    pub booking_id: Uuid,
    pub stage: ReturnStage,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let progress: Vec<u8> = ReturnStage::ALL.iter().map(|s| s.progress_percent()).collect();
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(progress.first(), Some(&0));
        assert_eq!(progress.last(), Some(&100));
    }

    #[test]
    fn test_next_stage() {
        assert_eq!(ReturnStage::NotStarted.next(), Some(ReturnStage::VehicleReceived));
        assert_eq!(ReturnStage::ChargesCalculated.next(), Some(ReturnStage::Settled));
        assert_eq!(ReturnStage::Settled.next(), None);
    }
}
