//! Historial de cambios de estado de una reserva

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::booking::BookingStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingStatusChange {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub from_status: BookingStatus,
    pub to_status: BookingStatus,
    pub note: Option<String>,
    pub changed_by: Uuid,
    pub created_at: DateTime<Utc>,
}
