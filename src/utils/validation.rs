//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! de reservas y notas del personal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::ValidationError;

/// Longitud máxima de una nota libre asociada a un cambio de estado
pub const MAX_NOTE_LENGTH: usize = 1000;

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar longitud mínima y máxima
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        let mut error = ValidationError::new("length");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &len);
        return Err(error);
    }
    Ok(())
}

/// Validar la nota de un cambio de estado: no vacía y con longitud acotada
pub fn validate_note(value: &str) -> Result<(), ValidationError> {
    validate_not_empty(value)?;
    validate_length(value, 1, MAX_NOTE_LENGTH)
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que el inicio de un periodo sea anterior a su fin
pub fn validate_period(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if start >= end {
        let mut error = ValidationError::new("period");
        error.add_param("start".into(), &start.to_rfc3339());
        error.add_param("end".into(), &end.to_rfc3339());
        return Err(error);
    }
    Ok(())
}
