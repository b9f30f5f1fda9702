//! Response encoding for the HTTP API.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::Error;
use crate::report::ReportFormat;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl Error {
    /// HTTP status reported for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Stable machine-readable code for the error body.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FlightNotFound { .. } => "not_found",
            Self::InvalidFlightStatus { .. } => "invalid_state",
            Self::InvalidRequest(_) => "invalid_request",
            _ => "internal",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            debug!("Rejected request: {}", self);
        } else {
            error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

/// An already encoded report body with its content type.
#[derive(Debug)]
pub struct Report {
    format: ReportFormat,
    body: String,
}

impl Report {
    /// Wrap an encoded body.
    #[must_use]
    pub fn new(format: ReportFormat, body: String) -> Self {
        Self { format, body }
    }
}

impl IntoResponse for Report {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, self.format.content_type())],
            self.body,
        )
            .into_response()
    }
}
