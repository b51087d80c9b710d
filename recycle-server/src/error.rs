//! Maps pricing failures onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use recycle_core::PriceError;
use serde_json::json;

/// A rejected command. Every variant is the caller's fault, so all map to 400.
#[derive(Debug)]
pub(crate) struct ApiError(PriceError);

impl From<PriceError> for ApiError {
    fn from(err: PriceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match &self.0 {
            PriceError::MissingCity => "missing_city",
            PriceError::UnknownRate { .. } => "unknown_rate",
            PriceError::MalformedEvent { .. } => "malformed_event",
            PriceError::UnsupportedCommand(_) => "unsupported_command",
            PriceError::Overflow { .. } => "overflow",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        tracing::warn!(kind, error = %self.0, "Rejected command");

        let body = Json(json!({
            "error": self.0.to_string(),
            "kind": kind,
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
