//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del acceso a datos
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

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Chassis number {0} already exists")]
    FahrgestellnummerExists(String),

    #[error("Version {0} is invalid")]
    VersionInvalid(String),

    #[error("Version {0} is outdated")]
    VersionOutdated(i32),

    #[error("Bad request: {0}")]
    BadRequest(String),
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
                eprintln!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                eprintln!("Validation error: {}", e);
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

            AppError::NotFound(msg) => {
                eprintln!("Resource not found: {}", msg);
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

            AppError::FahrgestellnummerExists(fahrgestellnummer) => {
                eprintln!("Duplicate chassis number: {}", fahrgestellnummer);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        error: "Duplicate Key".to_string(),
                        message: format!("Chassis number {} already exists", fahrgestellnummer),
                        details: None,
                        code: Some("DUPLICATE_KEY".to_string()),
                    },
                )
            }

            AppError::VersionInvalid(version) => {
                eprintln!("Invalid version token: {}", version);
                (
                    StatusCode::PRECONDITION_FAILED,
                    ErrorResponse {
                        error: "Version Invalid".to_string(),
                        message: format!("Version {} is invalid", version),
                        details: None,
                        code: Some("VERSION_INVALID".to_string()),
                    },
                )
            }

            AppError::VersionOutdated(version) => {
                eprintln!("Outdated version: {}", version);
                (
                    StatusCode::PRECONDITION_FAILED,
                    ErrorResponse {
                        error: "Version Outdated".to_string(),
                        message: format!("Version {} is outdated", version),
                        details: None,
                        code: Some("VERSION_OUTDATED".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                eprintln!("Bad request: {}", msg);
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
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("no vehicle".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_key_maps_to_422() {
        let response =
            AppError::FahrgestellnummerExists("W0L000051T2123456".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_version_errors_map_to_412() {
        let invalid = AppError::VersionInvalid("abc".to_string()).into_response();
        assert_eq!(invalid.status(), StatusCode::PRECONDITION_FAILED);

        let outdated = AppError::VersionOutdated(1).into_response();
        assert_eq!(outdated.status(), StatusCode::PRECONDITION_FAILED);
    }
}
