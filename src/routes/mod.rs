pub mod booking_routes;

use axum::{extract::State, middleware, response::Json, routing::get, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::middleware::{cors::cors_layer, auth::staff_auth_middleware};
use crate::state::AppState;

/// Crear el router completo de la aplicación
pub fn create_router(state: AppState) -> Router {
    let bookings = booking_routes::create_booking_router()
        .route_layer(middleware::from_fn_with_state(state.clone(), staff_auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api/bookings", bookings)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// Health check simple
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "rental-ops",
        "status": "ok",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
