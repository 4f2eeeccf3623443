use crate::state::AppState;
use axum::{
    extract::{
        rejection::{BytesRejection, JsonRejection},
        State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use jangle_classifier::{Outcome, PredictionError};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

/// Message returned when the URL form is submitted empty
pub const EMPTY_URL_MESSAGE: &str = "Please enter an image URL";

// ============================================================================
// Health endpoints
// ============================================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn info(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.info())
}

// ============================================================================
// Prediction endpoints
// ============================================================================

/// Classify the raw image bytes in the request body
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let message = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                format!("image exceeds {} bytes", state.config.max_upload_bytes)
            } else {
                rejection.body_text()
            };
            return reject(rejection.status(), PredictionError::new(message));
        }
    };

    let span = tracing::info_span!("predict", request_id = %Uuid::new_v4(), bytes = body.len());

    async move {
        let outcome = state.handler.handle(Some(&body)).await;
        log_outcome(&outcome);
        Json(outcome).into_response()
    }
    .instrument(span)
    .await
}

#[derive(Debug, Deserialize)]
pub struct PredictUrlRequest {
    #[serde(default)]
    pub url: String,
}

/// Fetch an image by URL and classify it
pub async fn predict_url(
    State(state): State<AppState>,
    req: Result<Json<PredictUrlRequest>, JsonRejection>,
) -> Response {
    let req = match req {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return reject(rejection.status(), PredictionError::fetch(rejection.body_text()))
        }
    };

    let url = req.url.trim().to_string();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": EMPTY_URL_MESSAGE })),
        )
            .into_response();
    }

    let span = tracing::info_span!("predict_url", request_id = %Uuid::new_v4(), %url);

    async move {
        let limit = state.config.max_upload_bytes;
        let outcome = match fetch_image(&state.http, &url, limit).await {
            Ok(bytes) => state.handler.handle(Some(&bytes)).await,
            Err(message) => {
                metrics::counter!("jangle_fetch_errors_total").increment(1);
                Outcome::Error(PredictionError::fetch(message))
            }
        };
        log_outcome(&outcome);
        (StatusCode::OK, Json(outcome)).into_response()
    }
    .instrument(span)
    .await
}

/// Download an image, refusing bodies larger than `limit` bytes
async fn fetch_image(client: &reqwest::Client, url: &str, limit: usize) -> Result<Bytes, String> {
    tracing::debug!("Fetching image from URL: {}", url);

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch image: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Failed to fetch image: {}", response.status().as_u16()));
    }

    let too_large = || format!("Failed to fetch image: image exceeds {} bytes", limit);

    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| format!("Failed to fetch image: {}", e))?
    {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(body))
}

fn reject(status: StatusCode, error: PredictionError) -> Response {
    tracing::info!(status = status.as_u16(), "{}", error.error);
    (status, Json(Outcome::Error(error))).into_response()
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Prediction(result) => tracing::info!(
            class = %result.predicted_class,
            latency_us = result.latency_us,
            "{}",
            result.verdict
        ),
        Outcome::Error(error) => tracing::info!("{}", error.error),
        Outcome::EmptyInput => tracing::info!("Empty upload"),
    }
}

// ============================================================================
// Metrics endpoint
// ============================================================================

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
