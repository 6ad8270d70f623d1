//! Servicio de operaciones de reservas
//!
//! Reúne las entradas de la proyección desde el almacén, aplica las
//! transiciones de estado validadas y gestiona la devolución. Tras cada
//! escritura la proyección se recalcula desde datos frescos.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    booking::{Booking, BookingStatus},
    inspection::condition_photos_complete,
    return_record::ReturnStage,
    status_history::BookingStatusChange,
};
use crate::repositories::{OperationsStore, ReturnStageUpdate, StatusUpdate};
use crate::services::lifecycle_projector::{
    project, Denial, DocumentReview, Gate, GatedAction, LifecycleProjection, ProjectionInput, WalkaroundFlags,
};
use crate::services::return_workflow::{self, ReturnWorkflowState};
use crate::utils::errors::{bad_request_error, internal_error, not_found_error, AppError, AppResult};

/// Reserva tras un cambio de estado junto con su proyección recalculada
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeOutcome {
    pub booking: Booking,
    pub operations: LifecycleProjection,
}

pub struct BookingOperationsService {
    store: Arc<dyn OperationsStore>,
}

/// Una lectura relacionada fallida se registra y cuenta como "no cargada"
fn loaded<T>(source: &str, booking_id: Uuid, result: AppResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("⚠️ No se pudo cargar {} de la reserva {}: {}", source, booking_id, e);
            None
        }
    }
}

fn denial_error(denial: &Denial) -> AppError {
    if denial.is_precondition() {
        AppError::PreconditionFailed(denial.to_string())
    } else {
        AppError::BadRequest(denial.to_string())
    }
}

impl BookingOperationsService {
    pub fn new(store: Arc<dyn OperationsStore>) -> Self {
        Self { store }
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))
    }

    async fn gather_input(&self, booking: &Booking) -> ProjectionInput {
        let id = booking.id;
        let (documents, payments, deposit, agreement, walkaround, prep, photos, return_record) = futures::join!(
            self.store.verification_documents(id),
            self.store.payments(id),
            self.store.deposit(id),
            self.store.agreement(id),
            self.store.walkaround(id),
            self.store.vehicle_prep(id),
            self.store.condition_photos(id),
            self.store.return_record(id),
        );

        let mut input = ProjectionInput::for_booking(booking);
        input.verification_documents = loaded("verification documents", id, documents)
            .map(|docs| docs.iter().map(DocumentReview::from).collect());
        input.payment_statuses =
            loaded("payments", id, payments).map(|payments| payments.iter().map(|p| p.status).collect());
        input.deposit_status = loaded("deposit", id, deposit).flatten().map(|d| d.status);
        input.agreement_status = loaded("agreement", id, agreement).flatten().map(|a| a.status);
        input.walkaround = loaded("walkaround", id, walkaround)
            .flatten()
            .as_ref()
            .map(WalkaroundFlags::from);
        input.vehicle_prep_complete =
            loaded("vehicle prep", id, prep).map(|checklist| checklist.map_or(false, |c| c.completed));
        input.condition_photos_complete =
            loaded("condition photos", id, photos).map(|photos| condition_photos_complete(&photos));
        input.return_stage = loaded("return", id, return_record)
            .map(|record| record.map_or(ReturnStage::NotStarted, |r| r.stage));
        input
    }

    pub async fn projection(&self, booking_id: Uuid) -> AppResult<LifecycleProjection> {
        let booking = self.get_booking(booking_id).await?;
        let input = self.gather_input(&booking).await;
        Ok(project(&input))
    }

    /// Mover la reserva a `target` si el grafo de estados y el checklist lo permiten
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
        note: Option<String>,
        staff_id: Uuid,
    ) -> AppResult<StatusChangeOutcome> {
        let booking = self.get_booking(booking_id).await?;
        let projection = project(&self.gather_input(&booking).await);
        let gate = projection.gate_for_transition(target);

        if !booking.status.can_transition_to(target) {
            return Err(match gate.denial() {
                Some(denial @ Denial::StatusNotAllowed { .. }) => denial_error(denial),
                _ => bad_request_error(&format!(
                    "booking is {} and cannot move to {}",
                    booking.status, target
                )),
            });
        }

        if let Gate::Denied(denial) = gate {
            return Err(denial_error(&denial));
        }

        self.commit(&booking, target, note, staff_id).await
    }

    /// Ejecutar una de las acciones del panel (activar, cancelar, avanzar)
    pub async fn perform(
        &self,
        booking_id: Uuid,
        action: GatedAction,
        note: Option<String>,
        staff_id: Uuid,
    ) -> AppResult<StatusChangeOutcome> {
        let booking = self.get_booking(booking_id).await?;
        let projection = project(&self.gather_input(&booking).await);

        if let Some(denial) = projection.gate(action).denial() {
            log::info!("🚫 {} denegado para la reserva {}: {}", action, booking_id, denial);
            return Err(denial_error(denial));
        }

        let target = match action {
            GatedAction::Activate => BookingStatus::Active,
            GatedAction::Cancel => BookingStatus::Cancelled,
            GatedAction::Advance => booking
                .status
                .next()
                .ok_or_else(|| internal_error("advance permitted on a booking without next status"))?,
        };

        self.commit(&booking, target, note, staff_id).await
    }

    async fn commit(
        &self,
        booking: &Booking,
        target: BookingStatus,
        note: Option<String>,
        staff_id: Uuid,
    ) -> AppResult<StatusChangeOutcome> {
        let update = StatusUpdate {
            booking_id: booking.id,
            expected_status: booking.status,
            target_status: target,
            note,
            changed_by: staff_id,
        };

        let updated = self.store.update_status(&update).await?;
        log::info!(
            "🔄 Reserva {}: {} → {} (staff {})",
            booking.id,
            booking.status,
            updated.status,
            staff_id
        );

        let operations = project(&self.gather_input(&updated).await);
        Ok(StatusChangeOutcome {
            booking: updated,
            operations,
        })
    }

    pub async fn status_history(&self, booking_id: Uuid) -> AppResult<Vec<BookingStatusChange>> {
        self.get_booking(booking_id).await?;
        self.store.status_history(booking_id).await
    }

    pub async fn return_state(&self, booking_id: Uuid) -> AppResult<ReturnWorkflowState> {
        let booking = self.get_booking(booking_id).await?;
        let stage = self
            .store
            .return_record(booking_id)
            .await?
            .map_or(ReturnStage::NotStarted, |r| r.stage);
        Ok(return_workflow::describe(booking_id, booking.status, stage))
    }

    /// Avanzar la devolución una etapa
    pub async fn advance_return(&self, booking_id: Uuid, staff_id: Uuid) -> AppResult<ReturnWorkflowState> {
        let booking = self.get_booking(booking_id).await?;
        let current = self
            .store
            .return_record(booking_id)
            .await?
            .map_or(ReturnStage::NotStarted, |r| r.stage);

        let next = return_workflow::next_stage(booking.status, current)
            .map_err(|denial| AppError::BadRequest(denial.to_string()))?;

        let record = self
            .store
            .save_return_stage(&ReturnStageUpdate {
                booking_id,
                expected_stage: current,
                stage: next,
                updated_by: staff_id,
            })
            .await?;

        log::info!(
            "📦 Devolución de la reserva {}: {} ({}%)",
            booking_id,
            record.stage.as_str(),
            record.stage.progress_percent()
        );

        Ok(return_workflow::describe(booking_id, booking.status, record.stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        agreement::{AgreementStatus, RentalAgreement},
        inspection::{ConditionPhoto, PhotoAngle, VehiclePrepChecklist, WalkaroundInspection},
        payment::{Deposit, Payment, PaymentStatus},
        return_record::ReturnRecord,
        verification::{DocumentType, VerificationDocument, VerificationStatus},
    };
    use crate::repositories::InMemoryOperationsStore;
    use crate::services::lifecycle_projector::OperationsStep;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    fn booking(status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            vehicle_id: Some(Uuid::new_v4()),
            pickup_location_id: Uuid::new_v4(),
            start_at: now + Duration::days(1),
            end_at: now + Duration::days(4),
            daily_rate: Decimal::new(5500, 2),
            subtotal: Decimal::new(16500, 2),
            tax: Decimal::new(3465, 2),
            total: Decimal::new(19965, 2),
            deposit_amount: Decimal::new(30000, 2),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reserva con intake, preparación y fotos listos
    async fn seed_ready_for_payment(store: &InMemoryOperationsStore, status: BookingStatus) -> Uuid {
        let booking = booking(status);
        let id = booking.id;
        store.insert_booking(booking).await.unwrap();
        for document_type in [DocumentType::LicenseFront, DocumentType::LicenseBack] {
            store
                .add_verification_document(VerificationDocument {
                    id: Uuid::new_v4(),
                    booking_id: id,
                    document_type,
                    status: VerificationStatus::Verified,
                    storage_path: format!("licenses/{}/{:?}.jpg", id, document_type),
                    uploaded_at: Utc::now(),
                    reviewed_at: Some(Utc::now()),
                })
                .await
                .unwrap();
        }
        store
            .set_vehicle_prep(VehiclePrepChecklist {
                id: Uuid::new_v4(),
                booking_id: id,
                completed: true,
                completed_at: Some(Utc::now()),
            })
            .await
            .unwrap();
        for angle in PhotoAngle::REQUIRED {
            store
                .add_condition_photo(ConditionPhoto {
                    id: Uuid::new_v4(),
                    booking_id: id,
                    angle,
                    storage_path: format!("photos/{}/{:?}.jpg", id, angle),
                    taken_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        id
    }

    async fn seed_activation_records(store: &InMemoryOperationsStore, id: Uuid) {
        store
            .add_payment(Payment {
                id: Uuid::new_v4(),
                booking_id: id,
                amount: Decimal::new(19965, 2),
                status: PaymentStatus::Completed,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store
            .set_agreement(RentalAgreement {
                id: Uuid::new_v4(),
                booking_id: id,
                status: AgreementStatus::Signed,
                signed_at: Some(Utc::now()),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store
            .set_walkaround(WalkaroundInspection {
                id: Uuid::new_v4(),
                booking_id: id,
                inspection_complete: true,
                customer_acknowledged: true,
                inspected_by: Some(Uuid::new_v4()),
                notes: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    fn service(store: Arc<InMemoryOperationsStore>) -> BookingOperationsService {
        BookingOperationsService::new(store)
    }

    #[tokio::test]
    async fn test_projection_reads_related_records() {
        let store = Arc::new(InMemoryOperationsStore::new());
        let id = seed_ready_for_payment(&store, BookingStatus::Confirmed).await;
        let projection = service(store).projection(id).await.unwrap();
        assert_eq!(projection.current_step, OperationsStep::Payment);
        assert!(projection.is_complete(OperationsStep::CheckIn));
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let store = Arc::new(InMemoryOperationsStore::new());
        let result = service(store).projection(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_activate_without_payment_fails_with_specific_reason() {
        let store = Arc::new(InMemoryOperationsStore::new());
        let id = seed_ready_for_payment(&store, BookingStatus::Confirmed).await;
        let result = service(store.clone())
            .perform(id, GatedAction::Activate, None, Uuid::new_v4())
            .await;
        match result {
            Err(AppError::PreconditionFailed(reason)) => assert!(reason.contains("payment"), "{}", reason),
            other => panic!("expected precondition failure, got {:?}", other.map(|o| o.booking.status)),
        }
        assert_eq!(store.find_booking(id).await.unwrap().unwrap().status, BookingStatus::Confirmed);
        assert!(store.status_history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_writes_status_and_reprojects() {
        let store = Arc::new(InMemoryOperationsStore::new());
        let id = seed_ready_for_payment(&store, BookingStatus::Confirmed).await;
        seed_activation_records(&store, id).await;
        let staff_id = Uuid::new_v4();

        let outcome = service(store.clone())
            .perform(id, GatedAction::Activate, Some("Keys handed over".to_string()), staff_id)
            .await
            .unwrap();

        assert_eq!(outcome.booking.status, BookingStatus::Active);
        assert_eq!(outcome.operations.status, BookingStatus::Active);
        assert!(!outcome.operations.can_cancel.is_permitted());

        let history = store.status_history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_status, BookingStatus::Confirmed);
        assert_eq!(history[0].to_status, BookingStatus::Active);
        assert_eq!(history[0].changed_by, staff_id);
        assert_eq!(history[0].note.as_deref(), Some("Keys handed over"));
    }

    #[tokio::test]
    async fn test_update_status_rejects_skipping_states() {
        let store = Arc::new(InMemoryOperationsStore::new());
        let id = seed_ready_for_payment(&store, BookingStatus::Pending).await;
        seed_activation_records(&store, id).await;
        let result = service(store)
            .update_status(id, BookingStatus::Completed, None, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_cancel_active_booking_is_rejected() {
        let store = Arc::new(InMemoryOperationsStore::new());
        let id = seed_ready_for_payment(&store, BookingStatus::Active).await;
        let result = service(store)
            .update_status(id, BookingStatus::Cancelled, None, Uuid::new_v4())
            .await;
        match result {
            Err(AppError::BadRequest(reason)) => assert!(reason.contains("cannot be cancelled")),
            other => panic!("expected bad request, got {:?}", other.map(|o| o.booking.status)),
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle_through_return() {
        let store = Arc::new(InMemoryOperationsStore::new());
        let id = seed_ready_for_payment(&store, BookingStatus::Pending).await;
        seed_activation_records(&store, id).await;
        let svc = service(store.clone());
        let staff = Uuid::new_v4();

        let confirmed = svc.perform(id, GatedAction::Advance, None, staff).await.unwrap();
        assert_eq!(confirmed.booking.status, BookingStatus::Confirmed);
        let active = svc.perform(id, GatedAction::Advance, None, staff).await.unwrap();
        assert_eq!(active.booking.status, BookingStatus::Active);

        let blocked = svc.perform(id, GatedAction::Advance, None, staff).await;
        assert!(matches!(blocked, Err(AppError::PreconditionFailed(_))));

        let mut state = svc.return_state(id).await.unwrap();
        while state.can_advance {
            state = svc.advance_return(id, staff).await.unwrap();
        }
        assert_eq!(state.stage, ReturnStage::Settled);
        assert_eq!(state.progress_percent, 100);

        let completed = svc.perform(id, GatedAction::Advance, None, staff).await.unwrap();
        assert_eq!(completed.booking.status, BookingStatus::Completed);
        assert!(!completed.operations.can_advance.is_permitted());
        assert_eq!(svc.status_history(id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_return_cannot_start_before_activation() {
        let store = Arc::new(InMemoryOperationsStore::new());
        let id = seed_ready_for_payment(&store, BookingStatus::Confirmed).await;
        let result = service(store).advance_return(id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    /// Almacén que encuentra la reserva pero falla en todas las demás lecturas
    struct FailingRelatedStore {
        booking: Booking,
    }

    fn unavailable() -> AppError {
        AppError::Internal("operations store unavailable".to_string())
    }

    #[async_trait::async_trait]
    impl OperationsStore for FailingRelatedStore {
        async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
            Ok(Some(self.booking.clone()).filter(|b| b.id == booking_id))
        }

        async fn verification_documents(&self, _: Uuid) -> AppResult<Vec<VerificationDocument>> {
            Err(unavailable())
        }

        async fn payments(&self, _: Uuid) -> AppResult<Vec<Payment>> {
            Err(unavailable())
        }

        async fn deposit(&self, _: Uuid) -> AppResult<Option<Deposit>> {
            Err(unavailable())
        }

        async fn agreement(&self, _: Uuid) -> AppResult<Option<RentalAgreement>> {
            Err(unavailable())
        }

        async fn walkaround(&self, _: Uuid) -> AppResult<Option<WalkaroundInspection>> {
            Err(unavailable())
        }

        async fn vehicle_prep(&self, _: Uuid) -> AppResult<Option<VehiclePrepChecklist>> {
            Err(unavailable())
        }

        async fn condition_photos(&self, _: Uuid) -> AppResult<Vec<ConditionPhoto>> {
            Err(unavailable())
        }

        async fn return_record(&self, _: Uuid) -> AppResult<Option<ReturnRecord>> {
            Err(unavailable())
        }

        async fn update_status(&self, _: &StatusUpdate) -> AppResult<Booking> {
            Err(unavailable())
        }

        async fn status_history(&self, _: Uuid) -> AppResult<Vec<BookingStatusChange>> {
            Err(unavailable())
        }

        async fn save_return_stage(&self, _: &ReturnStageUpdate) -> AppResult<ReturnRecord> {
            Err(unavailable())
        }
    }

    #[tokio::test]
    async fn test_failed_related_reads_count_as_not_loaded() {
        let booking = booking(BookingStatus::Confirmed);
        let id = booking.id;
        let service = BookingOperationsService::new(Arc::new(FailingRelatedStore { booking }));

        let projection = service.projection(id).await.unwrap();
        assert!(projection.steps.iter().all(|step| !step.complete));
        assert_eq!(projection.current_step, OperationsStep::Intake);
        assert!(!projection.deposit_held);
        match projection.can_activate.denial() {
            Some(Denial::StepIncomplete { step, .. }) => assert_eq!(*step, OperationsStep::Payment),
            other => panic!("unexpected activate gate: {:?}", other),
        }

        let result = service
            .perform(id, GatedAction::Activate, None, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::PreconditionFailed(_))));
    }
}
