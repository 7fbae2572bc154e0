use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tracing::debug;

use super::{
    error::ApiError,
    models::{HealthResponse, ValidateContentRequest},
    state::AppState,
    utils::json_body,
};
use crate::jobs::{JobKind, JobPayload, StatusReport, Submission};
use crate::pipeline::{
    ContentGenerationRequest, NicheAnalysisRequest, NicheAnalysisResult, character_count,
};
use crate::validation::{self, ValidationReport};

/// Content generation endpoint (POST /content)
///
/// Responds 200 with the generated post when the job ran directly and 202
/// with only the job id when it was queued.
pub async fn create_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let max_size = state.config.server.max_payload_bytes;
    let bytes = read_body(body, max_size).await?;
    let request: ContentGenerationRequest = json_body(&headers, &bytes, max_size)?;
    debug!(platform = %request.platform, "Content request received");

    submit(&state, JobKind::ContentGeneration, request.into()).await
}

/// Niche analysis endpoint (POST /niche)
pub async fn analyze_niche(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let max_size = state.config.server.max_payload_bytes;
    let bytes = read_body(body, max_size).await?;
    let request: NicheAnalysisRequest = json_body(&headers, &bytes, max_size)?;
    debug!(url = %request.website_url, "Niche analysis request received");

    submit(&state, JobKind::NicheAnalysis, request.into()).await
}

async fn submit(
    state: &AppState,
    kind: JobKind,
    payload: JobPayload,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let submission = state.router.submit(kind, payload).await?;
    let status = if submission.result.is_some() {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };

    Ok((status, Json(submission)))
}

/// Job status endpoint (GET /jobs/{kind}/{job_id})
///
/// Always 200 for a known kind; an id the router cannot resolve comes back
/// with status `unknown`.
pub async fn get_job(
    State(state): State<AppState>,
    Path((kind, job_id)): Path<(String, String)>,
) -> Result<Json<StatusReport>, ApiError> {
    let kind: JobKind = kind.parse()?;
    Ok(Json(state.router.status(kind, &job_id).await))
}

/// Post validation endpoint (POST /validate/content)
pub async fn validate_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ValidationReport>, ApiError> {
    let max_size = state.config.server.max_payload_bytes;
    let bytes = read_body(body, max_size).await?;
    let request: ValidateContentRequest = json_body(&headers, &bytes, max_size)?;

    let count = request
        .character_count
        .unwrap_or_else(|| character_count(&request.body, &request.hashtags));
    Ok(Json(validation::validate_content_for(
        &request.platform,
        &request.body,
        &request.hashtags,
        count,
    )))
}

/// Analysis validation endpoint (POST /validate/analysis)
pub async fn validate_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ValidationReport>, ApiError> {
    let max_size = state.config.server.max_payload_bytes;
    let bytes = read_body(body, max_size).await?;
    let result: NicheAnalysisResult = json_body(&headers, &bytes, max_size)?;

    Ok(Json(validation::validate_analysis(&result)))
}

/// Health check endpoint (GET /health)
///
/// Returns 503 Service Unavailable when the broker is configured but its
/// queue or workers are unusable; direct mode is always healthy.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.router.healthy();
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        mode: state.router.mode(),
        jobs: state.router.metrics().snapshot(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}

/// Reads the (already decompressed) request body, stopping once it grows
/// past `max_size`
async fn read_body(body: Body, max_size: usize) -> Result<Vec<u8>, ApiError> {
    let collected = Limited::new(body, max_size).collect().await.map_err(|err| {
        if err.downcast_ref::<LengthLimitError>().is_some() {
            ApiError::PayloadTooLarge(max_size)
        } else {
            ApiError::InvalidPayload(err.to_string())
        }
    })?;
    Ok(collected.to_bytes().to_vec())
}
