//! Flujo de devolución del vehículo
//!
//! Solo un alquiler activo puede avanzar su devolución, una etapa cada vez.
//! La etapa `settled` es final y es la que permite completar la reserva.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::models::{booking::BookingStatus, return_record::ReturnStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnDenial {
    BookingNotActive(BookingStatus),
    AlreadySettled,
}

impl fmt::Display for ReturnDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnDenial::BookingNotActive(status) => {
                write!(f, "returns can only be processed for active rentals (booking is {})", status)
            }
            ReturnDenial::AlreadySettled => write!(f, "the return is already settled"),
        }
    }
}

/// Etapa siguiente permitida desde `current`
pub fn next_stage(status: BookingStatus, current: ReturnStage) -> Result<ReturnStage, ReturnDenial> {
    if status != BookingStatus::Active {
        return Err(ReturnDenial::BookingNotActive(status));
    }
    current.next().ok_or(ReturnDenial::AlreadySettled)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnStageView {
    pub stage: ReturnStage,
    pub progress_percent: u8,
    pub reached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnWorkflowState {
    pub booking_id: Uuid,
    pub booking_status: BookingStatus,
    pub stage: ReturnStage,
    pub progress_percent: u8,
    pub next_stage: Option<ReturnStage>,
    pub can_advance: bool,
    pub reason: Option<String>,
    pub stages: Vec<ReturnStageView>,
}

pub fn describe(booking_id: Uuid, status: BookingStatus, current: ReturnStage) -> ReturnWorkflowState {
    let next = next_stage(status, current);
    ReturnWorkflowState {
        booking_id,
        booking_status: status,
        stage: current,
        progress_percent: current.progress_percent(),
        next_stage: next.ok(),
        can_advance: next.is_ok(),
        reason: next.err().map(|d| d.to_string()),
        stages: ReturnStage::ALL
            .iter()
            .map(|stage| ReturnStageView {
                stage: *stage,
                progress_percent: stage.progress_percent(),
                reached: *stage <= current,
            })
            .collect(),
    }
}
