use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{
    BookingActionRequest, BookingResponse, StatusChangeResponse, StatusChangeResult, UpdateBookingStatusRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedStaff;
use crate::repositories::OperationsStore;
use crate::services::booking_operations_service::BookingOperationsService;
use crate::services::lifecycle_projector::{GatedAction, LifecycleProjection};
use crate::services::return_workflow::ReturnWorkflowState;
use crate::utils::errors::AppError;

pub struct BookingController {
    service: BookingOperationsService,
}

impl BookingController {
    pub fn new(store: Arc<dyn OperationsStore>) -> Self {
        Self {
            service: BookingOperationsService::new(store),
        }
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<BookingResponse, AppError> {
        let booking = self.service.get_booking(id).await?;
        Ok(booking.into())
    }

    pub async fn operations(&self, id: Uuid) -> Result<LifecycleProjection, AppError> {
        self.service.projection(id).await
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        staff: &AuthenticatedStaff,
        request: UpdateBookingStatusRequest,
    ) -> Result<ApiResponse<StatusChangeResult>, AppError> {
        if !staff.role.can_set_status() {
            return Err(AppError::Forbidden(format!(
                "role {} cannot set a booking status directly; use the activate, cancel or advance actions",
                staff.role.as_str()
            )));
        }
        request.validate()?;

        let outcome = self
            .service
            .update_status(id, request.status, request.note, staff.staff_id)
            .await?;
        let message = format!("Booking moved to {}", outcome.booking.status);

        Ok(ApiResponse::success_with_message(outcome.into(), message))
    }

    pub async fn perform(
        &self,
        id: Uuid,
        action: GatedAction,
        staff: &AuthenticatedStaff,
        request: BookingActionRequest,
    ) -> Result<ApiResponse<StatusChangeResult>, AppError> {
        request.validate()?;

        let outcome = self.service.perform(id, action, request.note, staff.staff_id).await?;
        let message = format!("Booking {}: now {}", action, outcome.booking.status);

        Ok(ApiResponse::success_with_message(outcome.into(), message))
    }

    pub async fn status_history(&self, id: Uuid) -> Result<ApiResponse<Vec<StatusChangeResponse>>, AppError> {
        let history = self.service.status_history(id).await?;
        Ok(ApiResponse::success(history.into_iter().map(Into::into).collect()))
    }

    pub async fn return_state(&self, id: Uuid) -> Result<ReturnWorkflowState, AppError> {
        self.service.return_state(id).await
    }

    pub async fn advance_return(
        &self,
        id: Uuid,
        staff: &AuthenticatedStaff,
    ) -> Result<ApiResponse<ReturnWorkflowState>, AppError> {
        let state = self.service.advance_return(id, staff.staff_id).await?;
        let message = format!("Return advanced to {}", state.stage.as_str());
        Ok(ApiResponse::success_with_message(state, message))
    }
}
