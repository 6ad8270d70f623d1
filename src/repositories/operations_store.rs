//! Acceso a la reserva y a sus registros relacionados
//!
//! Cada lectura es independiente: el servicio las lanza en paralelo y una
//! lectura fallida solo deja su parte de la proyección como incompleta.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    models::{
        agreement::RentalAgreement,
        booking::{Booking, BookingStatus},
        inspection::{ConditionPhoto, VehiclePrepChecklist, WalkaroundInspection},
        payment::{Deposit, Payment},
        return_record::{ReturnRecord, ReturnStage},
        status_history::BookingStatusChange,
        verification::VerificationDocument,
    },
    utils::errors::AppResult,
};

/// Cambio de estado ya validado, listo para escribirse
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub booking_id: Uuid,
    /// Estado sobre el que se validó la transición
    pub expected_status: BookingStatus,
    pub target_status: BookingStatus,
    pub note: Option<String>,
    pub changed_by: Uuid,
}

/// Avance de etapa de devolución, condicionado a la etapa leída
#[derive(Debug, Clone)]
pub struct ReturnStageUpdate {
    pub booking_id: Uuid,
    pub expected_stage: ReturnStage,
    pub stage: ReturnStage,
    pub updated_by: Uuid,
}

#[async_trait]
pub trait OperationsStore: Send + Sync {
    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>>;

    async fn verification_documents(&self, booking_id: Uuid) -> AppResult<Vec<VerificationDocument>>;

    async fn payments(&self, booking_id: Uuid) -> AppResult<Vec<Payment>>;

    async fn deposit(&self, booking_id: Uuid) -> AppResult<Option<Deposit>>;

    async fn agreement(&self, booking_id: Uuid) -> AppResult<Option<RentalAgreement>>;

    async fn walkaround(&self, booking_id: Uuid) -> AppResult<Option<WalkaroundInspection>>;

    async fn vehicle_prep(&self, booking_id: Uuid) -> AppResult<Option<VehiclePrepChecklist>>;

    async fn condition_photos(&self, booking_id: Uuid) -> AppResult<Vec<ConditionPhoto>>;

    async fn return_record(&self, booking_id: Uuid) -> AppResult<Option<ReturnRecord>>;

    /// Escribe el nuevo estado solo si la reserva sigue en `expected_status`
    /// y añade la entrada de historial. Devuelve `Conflict` si otro cambio
    /// llegó antes.
    async fn update_status(&self, update: &StatusUpdate) -> AppResult<Booking>;

    /// Historial de estados, más reciente primero
    async fn status_history(&self, booking_id: Uuid) -> AppResult<Vec<BookingStatusChange>>;

    /// Guarda la nueva etapa solo si la devolución sigue en `expected_stage`
    async fn save_return_stage(&self, update: &ReturnStageUpdate) -> AppResult<ReturnRecord>;
}
