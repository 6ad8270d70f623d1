use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{Booking, BookingStatus};
use crate::models::status_history::BookingStatusChange;
use crate::services::booking_operations_service::StatusChangeOutcome;
use crate::services::lifecycle_projector::LifecycleProjection;
use crate::utils::validation::validate_note;

// Request para cambiar el estado de una reserva
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
    #[validate(custom = "validate_note")]
    pub note: Option<String>,
}

// Request para las acciones activar / cancelar / avanzar
#[derive(Debug, Default, Deserialize, Validate)]
pub struct BookingActionRequest {
    #[validate(custom = "validate_note")]
    pub note: Option<String>,
}

// Response de reserva
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub pickup_location_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub daily_rate: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub deposit_amount: Decimal,
    pub status: BookingStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            customer_id: booking.customer_id,
            vehicle_id: booking.vehicle_id,
            pickup_location_id: booking.pickup_location_id,
            start_at: booking.start_at,
            end_at: booking.end_at,
            daily_rate: booking.daily_rate,
            subtotal: booking.subtotal,
            tax: booking.tax,
            total: booking.total,
            deposit_amount: booking.deposit_amount,
            status: booking.status,
            updated_at: booking.updated_at,
        }
    }
}

// Resultado de un cambio de estado: reserva y checklist recalculado
#[derive(Debug, Serialize)]
pub struct StatusChangeResult {
    pub booking: BookingResponse,
    pub operations: LifecycleProjection,
}

impl From<StatusChangeOutcome> for StatusChangeResult {
    fn from(outcome: StatusChangeOutcome) -> Self {
        Self {
            booking: outcome.booking.into(),
            operations: outcome.operations,
        }
    }
}

// Entrada del historial de estados
#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    pub from_status: BookingStatus,
    pub to_status: BookingStatus,
    pub note: Option<String>,
    pub changed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<BookingStatusChange> for StatusChangeResponse {
    fn from(change: BookingStatusChange) -> Self {
        Self {
            from_status: change.from_status,
            to_status: change.to_status,
            note: change.note,
            changed_by: change.changed_by,
            created_at: change.created_at,
        }
    }
}
