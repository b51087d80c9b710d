//! HTTP routes: the command endpoint and a health probe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use recycle_core::{EventEnvelope, PriceService, PriceWasCalculated, RecycleRequest};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Build the application router around a shared price service.
pub(crate) fn app(service: Arc<PriceService>) -> Router {
    Router::new()
        .route("/handle-command", post(handle_command))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn handle_command(
    State(service): State<Arc<PriceService>>,
    Json(request): Json<RecycleRequest>,
) -> Result<Json<EventEnvelope<PriceWasCalculated>>, ApiError> {
    tracing::info!(
        command_id = %request.command.command_id,
        request = %to_log_json(&request),
        "/handle-command request"
    );

    let response = service.calculate(&request)?;

    tracing::info!(
        event_id = %response.event_id,
        response = %to_log_json(&response),
        "/handle-command response"
    );
    Ok(Json(response))
}

async fn health(State(service): State<Arc<PriceService>>) -> impl IntoResponse {
    let cities: Vec<String> = service.cities().into_iter().map(|city| city.id.0).collect();

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "cities": cities,
        })),
    )
}

fn to_log_json<T: Serialize>(body: &T) -> String {
    serde_json::to_string(body).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}
