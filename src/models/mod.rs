//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL de reservas y operaciones.

pub mod agreement;
pub mod booking;
pub mod inspection;
pub mod payment;
pub mod return_record;
pub mod status_history;
pub mod verification;
