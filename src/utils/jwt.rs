//! Utilidades JWT para el personal del back office
//!
//! Los tokens identifican al empleado que ejecuta un cambio de estado.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::environment::EnvironmentConfig, utils::errors::AppError};

/// Rol del empleado dentro del back office
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Agent,
    Manager,
    Admin,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Agent => "agent",
            StaffRole::Manager => "manager",
            StaffRole::Admin => "admin",
        }
    }

    /// Solo managers y admins pueden fijar un estado directamente; los agentes
    /// usan las acciones activar, cancelar y avanzar.
    pub fn can_set_status(&self) -> bool {
        matches!(self, StaffRole::Manager | StaffRole::Admin)
    }
}

/// Claims del JWT de personal
#[derive(Debug, Serialize, Deserialize)]
pub struct StaffClaims {
    pub sub: String, // staff_id
    pub role: StaffRole,
    pub exp: usize,
    pub iat: usize,
}

/// Configuración de JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration: u64,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration,
        }
    }
}

/// Generar JWT token para un empleado
pub fn generate_token(staff_id: Uuid, role: StaffRole, config: &JwtConfig) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::seconds(config.expiration as i64);

    let claims = StaffClaims {
        sub: staff_id.to_string(),
        role,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::Jwt(format!("Error generating token: {}", e)))
}

/// Verificar y decodificar JWT token
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<StaffClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

    let token_data = decode::<StaffClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AppError::Jwt(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Extraer token del header Authorization
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization header must start with 'Bearer '".to_string()))?;

    if token.is_empty() {
        return Err(AppError::Unauthorized("Token must not be empty".to_string()));
    }

    Ok(token)
}
