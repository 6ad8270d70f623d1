//! Almacén en memoria
//!
//! Implementa `OperationsStore` sobre un `HashMap` protegido por `RwLock`.
//! Se usa con `STORAGE_BACKEND=memory` para ejecuciones locales y en los tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    agreement::RentalAgreement,
    booking::Booking,
    inspection::{ConditionPhoto, VehiclePrepChecklist, WalkaroundInspection},
    payment::{Deposit, Payment},
    return_record::{ReturnRecord, ReturnStage},
    status_history::BookingStatusChange,
    verification::VerificationDocument,
};
use crate::repositories::operations_store::{OperationsStore, ReturnStageUpdate, StatusUpdate};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Debug, Clone)]
struct BookingRecords {
    booking: Booking,
    documents: Vec<VerificationDocument>,
    payments: Vec<Payment>,
    deposit: Option<Deposit>,
    agreement: Option<RentalAgreement>,
    walkaround: Option<WalkaroundInspection>,
    vehicle_prep: Option<VehiclePrepChecklist>,
    photos: Vec<ConditionPhoto>,
    return_record: Option<ReturnRecord>,
    history: Vec<BookingStatusChange>,
}

impl BookingRecords {
    fn new(booking: Booking) -> Self {
        Self {
            booking,
            documents: Vec::new(),
            payments: Vec::new(),
            deposit: None,
            agreement: None,
            walkaround: None,
            vehicle_prep: None,
            photos: Vec::new(),
            return_record: None,
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOperationsStore {
    records: RwLock<HashMap<Uuid, BookingRecords>>,
}

impl InMemoryOperationsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar una reserva nueva (valida importes y periodo)
    pub async fn insert_booking(&self, booking: Booking) -> AppResult<()> {
        booking.validate()?;
        let mut records = self.records.write().await;
        if records.contains_key(&booking.id) {
            return Err(AppError::Conflict(format!("Booking {} already exists", booking.id)));
        }
        records.insert(booking.id, BookingRecords::new(booking));
        Ok(())
    }

    async fn with_records<T>(
        &self,
        booking_id: Uuid,
        apply: impl FnOnce(&mut BookingRecords) -> T,
    ) -> AppResult<T> {
        let mut records = self.records.write().await;
        let entry = records
            .get_mut(&booking_id)
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))?;
        Ok(apply(entry))
    }

    async fn read<T>(&self, booking_id: Uuid, read: impl FnOnce(&BookingRecords) -> T, empty: T) -> T {
        let records = self.records.read().await;
        records.get(&booking_id).map(read).unwrap_or(empty)
    }

    pub async fn add_verification_document(&self, document: VerificationDocument) -> AppResult<()> {
        self.with_records(document.booking_id, |r| r.documents.push(document)).await
    }

    pub async fn add_payment(&self, payment: Payment) -> AppResult<()> {
        self.with_records(payment.booking_id, |r| r.payments.push(payment)).await
    }

    pub async fn set_deposit(&self, deposit: Deposit) -> AppResult<()> {
        self.with_records(deposit.booking_id, |r| r.deposit = Some(deposit)).await
    }

    pub async fn set_agreement(&self, agreement: RentalAgreement) -> AppResult<()> {
        self.with_records(agreement.booking_id, |r| r.agreement = Some(agreement)).await
    }

    pub async fn set_walkaround(&self, inspection: WalkaroundInspection) -> AppResult<()> {
        self.with_records(inspection.booking_id, |r| r.walkaround = Some(inspection)).await
    }

    pub async fn set_vehicle_prep(&self, checklist: VehiclePrepChecklist) -> AppResult<()> {
        self.with_records(checklist.booking_id, |r| r.vehicle_prep = Some(checklist)).await
    }

    pub async fn add_condition_photo(&self, photo: ConditionPhoto) -> AppResult<()> {
        self.with_records(photo.booking_id, |r| r.photos.push(photo)).await
    }
}

#[async_trait]
impl OperationsStore for InMemoryOperationsStore {
    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.read(booking_id, |r| Some(r.booking.clone()), None).await)
    }

    async fn verification_documents(&self, booking_id: Uuid) -> AppResult<Vec<VerificationDocument>> {
        Ok(self.read(booking_id, |r| r.documents.clone(), Vec::new()).await)
    }

    async fn payments(&self, booking_id: Uuid) -> AppResult<Vec<Payment>> {
        Ok(self.read(booking_id, |r| r.payments.clone(), Vec::new()).await)
    }

    async fn deposit(&self, booking_id: Uuid) -> AppResult<Option<Deposit>> {
        Ok(self.read(booking_id, |r| r.deposit.clone(), None).await)
    }

    async fn agreement(&self, booking_id: Uuid) -> AppResult<Option<RentalAgreement>> {
        Ok(self.read(booking_id, |r| r.agreement.clone(), None).await)
    }

    async fn walkaround(&self, booking_id: Uuid) -> AppResult<Option<WalkaroundInspection>> {
        Ok(self.read(booking_id, |r| r.walkaround.clone(), None).await)
    }

    async fn vehicle_prep(&self, booking_id: Uuid) -> AppResult<Option<VehiclePrepChecklist>> {
        Ok(self.read(booking_id, |r| r.vehicle_prep.clone(), None).await)
    }

    async fn condition_photos(&self, booking_id: Uuid) -> AppResult<Vec<ConditionPhoto>> {
        Ok(self.read(booking_id, |r| r.photos.clone(), Vec::new()).await)
    }

    async fn return_record(&self, booking_id: Uuid) -> AppResult<Option<ReturnRecord>> {
        Ok(self.read(booking_id, |r| r.return_record.clone(), None).await)
    }

    async fn update_status(&self, update: &StatusUpdate) -> AppResult<Booking> {
        self.with_records(update.booking_id, |r| {
            if r.booking.status != update.expected_status {
                return Err(AppError::Conflict(format!(
                    "Booking {} is no longer {}; reload and try again",
                    update.booking_id, update.expected_status
                )));
            }

            let now = Utc::now();
            r.booking.status = update.target_status;
            r.booking.updated_at = now;
            r.history.push(BookingStatusChange {
                id: Uuid::new_v4(),
                booking_id: update.booking_id,
                from_status: update.expected_status,
                to_status: update.target_status,
                note: update.note.clone(),
                changed_by: update.changed_by,
                created_at: now,
            });
            Ok(r.booking.clone())
        })
        .await?
    }

    async fn status_history(&self, booking_id: Uuid) -> AppResult<Vec<BookingStatusChange>> {
        Ok(self
            .read(booking_id, |r| r.history.iter().rev().cloned().collect(), Vec::new())
            .await)
    }

    async fn save_return_stage(&self, update: &ReturnStageUpdate) -> AppResult<ReturnRecord> {
        self.with_records(update.booking_id, |r| {
            let current = r
                .return_record
                .as_ref()
                .map_or(ReturnStage::NotStarted, |record| record.stage);
            if current != update.expected_stage {
                return Err(AppError::Conflict(format!(
                    "Return for booking {} is no longer at stage {}; reload and try again",
                    update.booking_id,
                    update.expected_stage.as_str()
                )));
            }

            let record = ReturnRecord {
                booking_id: update.booking_id,
                stage: update.stage,
                updated_by: Some(update.updated_by),
                updated_at: Utc::now(),
            };
            r.return_record = Some(record.clone());
            Ok(record)
        })
        .await?
    }
}
