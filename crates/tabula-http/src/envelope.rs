//! Success response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// `{"success": true, "data": .., "message": ..}` with a status code.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(skip)]
    status: StatusCode,
    success: bool,
    data: T,
    message: String,
}

impl<T: Serialize> Envelope<T> {
    /// 200 OK.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, data, message)
    }

    /// 201 Created.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    fn with_status(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status,
            success: true,
            data,
            message: message.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
