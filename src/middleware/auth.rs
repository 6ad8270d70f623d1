//! Middleware de autenticación JWT
//!
//! Este módulo verifica el token del personal y deja el empleado
//! autenticado en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token, StaffRole},
    },
};

/// Empleado autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedStaff {
    pub staff_id: Uuid,
    pub role: StaffRole,
}

/// Middleware de autenticación JWT para el back office
pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.jwt)?;

    let staff_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid staff id in token".to_string()))?;

    request.extensions_mut().insert(AuthenticatedStaff {
        staff_id,
        role: claims.role,
    });

    Ok(next.run(request).await)
}
