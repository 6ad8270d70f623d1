//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Un paso u otra condición del checklist no se cumple todavía
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "The booking store rejected the operation".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "Unauthorized".to_string(),
                        message: msg,
                        details: None,
                        code: Some("UNAUTHORIZED".to_string()),
                    },
                )
            }

            AppError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code: Some("FORBIDDEN".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => {
                tracing::warn!("Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Not Found".to_string(),
                        message: msg,
                        details: None,
                        code: Some("NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Conflict".to_string(),
                        message: msg,
                        details: None,
                        code: Some("CONFLICT".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Bad Request".to_string(),
                        message: msg,
                        details: None,
                        code: Some("BAD_REQUEST".to_string()),
                    },
                )
            }

            AppError::PreconditionFailed(msg) => {
                tracing::info!("Precondition failed: {}", msg);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        error: "Precondition Failed".to_string(),
                        message: msg,
                        details: None,
                        code: Some("PRECONDITION_FAILED".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }

            AppError::Jwt(msg) => {
                tracing::warn!("JWT error: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "JWT Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("JWT_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Función helper para crear errores internos
pub fn internal_error(message: &str) -> AppError {
    AppError::Internal(message.to_string())
}
