use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{
    BookingActionRequest, BookingResponse, StatusChangeResponse, StatusChangeResult, UpdateBookingStatusRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedStaff;
use crate::services::lifecycle_projector::{GatedAction, LifecycleProjection};
use crate::services::return_workflow::ReturnWorkflowState;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_booking))
        .route("/:id/operations", get(get_operations))
        .route("/:id/status", post(update_status))
        .route("/:id/activate", post(activate_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/advance", post(advance_booking))
        .route("/:id/status-history", get(get_status_history))
        .route("/:id/return", get(get_return))
        .route("/:id/return/advance", post(advance_return))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.store.clone());
    let response = controller.get_booking(id).await?;
    Ok(Json(response))
}

async fn get_operations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LifecycleProjection>, AppError> {
    let controller = BookingController::new(state.store.clone());
    let response = controller.operations(id).await?;
    Ok(Json(response))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> Result<Json<ApiResponse<StatusChangeResult>>, AppError> {
    let controller = BookingController::new(state.store.clone());
    let response = controller.update_status(id, &staff, request).await?;
    Ok(Json(response))
}

/// El cuerpo de una acción es opcional: vacío equivale a "sin nota", pero si
/// llega algo tiene que ser un `BookingActionRequest` JSON válido.
fn parse_action_body(headers: &HeaderMap, body: &Bytes) -> Result<BookingActionRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BookingActionRequest::default());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("application/json"));
    if !is_json {
        return Err(AppError::BadRequest(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }

    Json::<BookingActionRequest>::from_bytes(body)
        .map(|Json(request)| request)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn run_action(
    state: AppState,
    staff: AuthenticatedStaff,
    id: Uuid,
    action: GatedAction,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<StatusChangeResult>>, AppError> {
    let request = parse_action_body(&headers, &body)?;
    let controller = BookingController::new(state.store.clone());
    let response = controller.perform(id, action, &staff, request).await?;
    Ok(Json(response))
}

async fn activate_booking(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<StatusChangeResult>>, AppError> {
    run_action(state, staff, id, GatedAction::Activate, headers, body).await
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<StatusChangeResult>>, AppError> {
    run_action(state, staff, id, GatedAction::Cancel, headers, body).await
}

async fn advance_booking(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<StatusChangeResult>>, AppError> {
    run_action(state, staff, id, GatedAction::Advance, headers, body).await
}

async fn get_status_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StatusChangeResponse>>>, AppError> {
    let controller = BookingController::new(state.store.clone());
    let response = controller.status_history(id).await?;
    Ok(Json(response))
}

async fn get_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReturnWorkflowState>, AppError> {
    let controller = BookingController::new(state.store.clone());
    let response = controller.return_state(id).await?;
    Ok(Json(response))
}

async fn advance_return(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReturnWorkflowState>>, AppError> {
    let controller = BookingController::new(state.store.clone());
    let response = controller.advance_return(id, &staff).await?;
    Ok(Json(response))
}
