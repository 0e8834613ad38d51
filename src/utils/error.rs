// utils/error.rs
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::core::session::{removal_cookie, TOKEN_KEY};

/// Vue vers laquelle le client est renvoyé après un 401
pub const LOGIN_REDIRECT: &str = "/login";

#[derive(Error, Debug)]
pub enum AppError {
    // Erreurs d'authentification
    #[error("Authentication failed")]
    Unauthorized,

    #[error("{0}")]
    InvalidCredentials(String),

    // Erreurs de session
    #[error("No project selected")]
    NoProjectSelected,

    // Erreurs de configuration projet
    #[error("Project info not found: {0}")]
    ProjectNotFound(String),

    #[error("No {field} path found for project {project}")]
    MissingProjectPath { project: String, field: &'static str },

    #[error("User not found: {0}")]
    UserNotFound(String),

    // Erreurs de données
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid GCS URL, must be in the form gs://bucket-name/path/to/file: {0}")]
    InvalidStorageUri(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    // Erreurs de ressources
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Erreurs externes
    #[error("Backend responded with {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("External service error: {0}")]
    ExternalService(String),

    // Erreurs de stockage
    #[error("Storage error: {0}")]
    StorageError(String),

    // Erreurs système
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error")]
    Internal,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            // 400 - Bad Request
            AppError::Validation(_)
            | AppError::InvalidStorageUri(_)
            | AppError::NoProjectSelected => {
                HttpResponse::BadRequest().json(json!({
                    "error": self.to_string(),
                    "code": "BAD_REQUEST"
                }))
            }

            // 401 - Unauthorized : le token est oublié et le client renvoyé au login
            AppError::Unauthorized | AppError::InvalidCredentials(_) => {
                HttpResponse::Unauthorized().cookie(removal_cookie(TOKEN_KEY)).json(json!({
                    "error": self.to_string(),
                    "code": "UNAUTHORIZED",
                    "redirect": LOGIN_REDIRECT
                }))
            }

            // 404 - Not Found
            AppError::NotFound(_)
            | AppError::ProjectNotFound(_)
            | AppError::MissingProjectPath { .. }
            | AppError::UserNotFound(_) => {
                HttpResponse::NotFound().json(json!({
                    "error": self.to_string(),
                    "code": "NOT_FOUND"
                }))
            }

            // 502 - Bad Gateway
            AppError::Backend { .. } | AppError::ExternalService(_) => {
                tracing::warn!("Upstream failure: {}", self);
                HttpResponse::BadGateway().json(json!({
                    "error": self.to_string(),
                    "code": "BAD_GATEWAY"
                }))
            }

            // 500 - Internal Server Error
            _ => {
                tracing::error!("Internal server error: {}", self);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error",
                    "code": "INTERNAL_ERROR"
                }))
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializeError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::StorageError(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::ExternalService("Request timeout".to_string())
        } else if err.is_connect() {
            AppError::ExternalService("Connection failed".to_string())
        } else if err.is_decode() {
            AppError::ParseError(err.to_string())
        } else {
            AppError::ExternalService(format!("HTTP request error: {}", err))
        }
    }
}

impl From<globset::Error> for AppError {
    fn from(err: globset::Error) -> Self {
        AppError::Validation(format!("invalid glob: {}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Task join error: {}", err);
        AppError::Internal
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let error_messages: Vec<String> = errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect();

        AppError::Validation(messages.join("; "))
    }
}

// Type de résultat standard
pub type Result<T> = std::result::Result<T, AppError>;
