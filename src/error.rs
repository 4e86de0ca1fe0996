//! # error
//!
//! Error types for the monitor.
//!
//! [`MonitorError`] is the domain taxonomy shared by the store, the quote
//! source and the notifier.  [`AppError`] is what every HTTP handler returns;
//! Axum's `IntoResponse` impl turns it into a JSON body so the dashboard
//! always gets a machine-readable response even on failure.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// ─── Domain Errors ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    /// Network failure, timeout, non-success status or malformed payload.
    /// Recovered locally as "no data this cycle".
    #[error("quote unavailable for {ticker}: {reason}")]
    QuoteUnavailable { ticker: String, reason: String },

    /// The notification could not be delivered.  Never blocks the alert
    /// transition or its persistence.
    #[error("notification failed: {0}")]
    NotifyFailed(String),

    /// Rejected at creation; the position is never stored.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// Backend unreachable or unwritable.
    #[error("position store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("position {0} not found")]
    PositionNotFound(Uuid),
}

impl MonitorError {
    pub fn quote_unavailable(ticker: &str, reason: impl ToString) -> Self {
        MonitorError::QuoteUnavailable {
            ticker: ticker.to_string(),
            reason: reason.to_string(),
        }
    }
}

// ─── HTTP Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    /// A domain failure surfaced through the API.
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// Body missing, not JSON, or not the expected shape.
    #[error("Invalid request body: {0}")]
    BadBody(#[from] JsonRejection),

    /// The requested resource (e.g. the first snapshot) does not exist yet.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Monitor(MonitorError::InvalidPosition(_)) => StatusCode::BAD_REQUEST,
            AppError::Monitor(MonitorError::PositionNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Monitor(MonitorError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Monitor(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadBody(rejection) => rejection.status(),
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "ok":    false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
