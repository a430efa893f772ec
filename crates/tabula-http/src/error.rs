//! API errors and their HTTP mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

use tabula_core::{Error, Violations};

use crate::router::RunMode;

/// Errors returned by the HTTP surface.
#[derive(Debug, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Field constraints were violated.
    #[error("{0}")]
    Validation(Violations),

    /// The body was missing or not valid JSON.
    #[error("{0}")]
    InvalidBody(String),

    /// The id or body could not be interpreted.
    #[error("{0}")]
    InvalidInput(String),

    /// No record with this id.
    #[error("{label} with id {id} does not exist")]
    NotFound { label: String, id: String },

    /// No route matches the path.
    #[error("Route {method} {path} does not exist")]
    RouteNotFound { method: String, path: String },

    /// The route exists but not for this method.
    #[error("Method {method} is not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Storage or other server fault. `detail` is only set in development.
    #[error("{}", .detail.as_deref().unwrap_or("Internal server error"))]
    Internal { detail: Option<String> },
}

impl ApiError {
    /// Map a service error for the resource with the given label.
    pub fn from_service(err: Error, label: &str, mode: RunMode) -> Self {
        match err {
            Error::ValidationFailed(violations) => ApiError::Validation(violations),
            Error::NotFound { id } => ApiError::NotFound {
                label: label.to_string(),
                id,
            },
            Error::InvalidInput(e) => ApiError::InvalidInput(e.to_string()),
            Error::StorageUnavailable(e) => {
                error!(error = %e, "Storage failure");
                ApiError::Internal {
                    detail: (mode == RunMode::Development).then(|| e.to_string()),
                }
            }
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidBody(_) | ApiError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short error kind for the `error` field of the envelope.
    fn kind(&self) -> String {
        match self {
            ApiError::Validation(_) => "Validation failed".to_string(),
            ApiError::InvalidBody(_) => "Invalid request body".to_string(),
            ApiError::InvalidInput(_) => "Invalid input".to_string(),
            ApiError::NotFound { label, .. } => format!("{label} not found"),
            ApiError::RouteNotFound { .. } => "Route not found".to_string(),
            ApiError::MethodNotAllowed { .. } => "Method not allowed".to_string(),
            ApiError::Internal { .. } => "Internal server error".to_string(),
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let ApiError::Validation(violations) = self {
            body["errors"] = json!(violations);
        }
        body
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
