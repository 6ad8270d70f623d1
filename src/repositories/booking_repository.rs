use async_trait::async_trait;
use sqlx::PgPool;
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
use crate::utils::errors::{AppError, AppResult};

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OperationsStore for BookingRepository {
    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn verification_documents(&self, booking_id: Uuid) -> AppResult<Vec<VerificationDocument>> {
        let documents = sqlx::query_as::<_, VerificationDocument>(
            "SELECT * FROM verification_documents WHERE booking_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn payments(&self, booking_id: Uuid) -> AppResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at DESC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn deposit(&self, booking_id: Uuid) -> AppResult<Option<Deposit>> {
        let deposit = sqlx::query_as::<_, Deposit>(
            "SELECT * FROM deposits WHERE booking_id = $1 ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deposit)
    }

    async fn agreement(&self, booking_id: Uuid) -> AppResult<Option<RentalAgreement>> {
        let agreement = sqlx::query_as::<_, RentalAgreement>(
            "SELECT * FROM rental_agreements WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agreement)
    }

    async fn walkaround(&self, booking_id: Uuid) -> AppResult<Option<WalkaroundInspection>> {
        let inspection = sqlx::query_as::<_, WalkaroundInspection>(
            "SELECT * FROM walkaround_inspections WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inspection)
    }

    async fn vehicle_prep(&self, booking_id: Uuid) -> AppResult<Option<VehiclePrepChecklist>> {
        let checklist = sqlx::query_as::<_, VehiclePrepChecklist>(
            "SELECT * FROM vehicle_prep_checklists WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(checklist)
    }

    async fn condition_photos(&self, booking_id: Uuid) -> AppResult<Vec<ConditionPhoto>> {
        let photos = sqlx::query_as::<_, ConditionPhoto>(
            "SELECT * FROM condition_photos WHERE booking_id = $1 ORDER BY taken_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    async fn return_record(&self, booking_id: Uuid) -> AppResult<Option<ReturnRecord>> {
        let record = sqlx::query_as::<_, ReturnRecord>(
            "SELECT * FROM return_records WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_status(&self, update: &StatusUpdate) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        // Solo se escribe si nadie cambió el estado desde la validación
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(update.booking_id)
        .bind(update.expected_status)
        .bind(update.target_status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Booking {} is no longer {}; reload and try again",
                update.booking_id, update.expected_status
            ))
        })?;

        sqlx::query(
            r#"
            INSERT INTO booking_status_history (id, booking_id, from_status, to_status, note, changed_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(update.booking_id)
        .bind(update.expected_status)
        .bind(update.target_status)
        .bind(&update.note)
        .bind(update.changed_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(booking)
    }

    async fn status_history(&self, booking_id: Uuid) -> AppResult<Vec<BookingStatusChange>> {
        let history = sqlx::query_as::<_, BookingStatusChange>(
            "SELECT * FROM booking_status_history WHERE booking_id = $1 ORDER BY created_at DESC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }

    async fn save_return_stage(&self, update: &ReturnStageUpdate) -> AppResult<ReturnRecord> {
        let record = if update.expected_stage == ReturnStage::NotStarted {
            sqlx::query_as::<_, ReturnRecord>(
                r#"
                INSERT INTO return_records (booking_id, stage, updated_by, updated_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (booking_id) DO UPDATE
                SET stage = EXCLUDED.stage, updated_by = EXCLUDED.updated_by, updated_at = EXCLUDED.updated_at
                WHERE return_records.stage = $4
                RETURNING *
                "#,
            )
            .bind(update.booking_id)
            .bind(update.stage)
            .bind(update.updated_by)
            .bind(update.expected_stage)
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, ReturnRecord>(
                r#"
                UPDATE return_records
                SET stage = $2, updated_by = $3, updated_at = NOW()
                WHERE booking_id = $1 AND stage = $4
                RETURNING *
                "#,
            )
            .bind(update.booking_id)
            .bind(update.stage)
            .bind(update.updated_by)
            .bind(update.expected_stage)
            .fetch_optional(&self.pool)
            .await?
        };

        record.ok_or_else(|| {
            AppError::Conflict(format!(
                "Return for booking {} is no longer at stage {}; reload and try again",
                update.booking_id,
                update.expected_stage.as_str()
            ))
        })
    }
}
