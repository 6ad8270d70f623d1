//! Modelo de Booking
//!
//! Este módulo contiene el struct Booking y su estado de ciclo de vida.
//! Mapea exactamente a la tabla bookings del schema PostgreSQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::utils::validation::{validate_non_negative, validate_period};

/// Estado de la reserva - mapea al ENUM booking_status
///
/// Es el único campo autoritativo del ciclo de vida: solo cambia mediante
/// la operación explícita de actualización de estado.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Siguiente estado en la secuencia normal del alquiler
    pub fn next(&self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Pending => Some(BookingStatus::Confirmed),
            BookingStatus::Confirmed => Some(BookingStatus::Active),
            BookingStatus::Active => Some(BookingStatus::Completed),
            BookingStatus::Completed | BookingStatus::Cancelled => None,
        }
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Transiciones legales del grafo de estados, sin saltar estados intermedios
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        if target == BookingStatus::Cancelled {
            return self.is_cancellable();
        }
        self.next() == Some(target)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Comprobar importes no negativos y un periodo de alquiler coherente
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_period(self.start_at, self.end_at) {
            errors.add("end_at", e);
        }

        let amounts = [
            ("daily_rate", self.daily_rate),
            ("subtotal", self.subtotal),
            ("tax", self.tax),
            ("total", self.total),
            ("deposit_amount", self.deposit_amount),
        ];
        for (field, amount) in amounts {
            if let Err(e) = validate_non_negative(amount) {
                errors.add(field, e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_status_sequence() {
        assert_eq!(BookingStatus::Pending.next(), Some(BookingStatus::Confirmed));
        assert_eq!(BookingStatus::Confirmed.next(), Some(BookingStatus::Active));
        assert_eq!(BookingStatus::Active.next(), Some(BookingStatus::Completed));
        assert_eq!(BookingStatus::Completed.next(), None);
        assert_eq!(BookingStatus::Cancelled.next(), None);
    }

    #[test]
    fn test_cancel_only_from_pending_or_confirmed() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Active.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn test_transitions_cannot_skip_states() {
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Active));
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Active.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }
}
