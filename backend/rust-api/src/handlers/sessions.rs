use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    models::{CreateSessionRequest, RecordAnswerRequest},
    services::{generation_service::GenerationError, session_service::SessionService, AppState},
};

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Err(errors) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": errors.to_string() })),
        ));
    }

    tracing::info!(
        subject = %req.subject,
        mode = req.mode.as_str(),
        timed = req.timed,
        plan = req.account.plan.as_str(),
        "Creating practice session"
    );

    let service = SessionService::new(state);
    match service.create_session(req).await {
        Ok(snapshot) => Ok((StatusCode::CREATED, Json(snapshot))),
        Err(e) => {
            tracing::error!("Failed to create session: {}", e);
            Err(generation_error_response(e))
        }
    }
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state);
    match service.snapshot(&session_id).await {
        Some(snapshot) => Ok((StatusCode::OK, Json(snapshot))),
        None => Err(session_not_found()),
    }
}

pub async fn record_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state);
    match service.record_answer(&session_id, req.option_index).await {
        Some(snapshot) => Ok((StatusCode::OK, Json(snapshot))),
        None => Err(session_not_found()),
    }
}

pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state);
    match service.advance(&session_id).await {
        Some(snapshot) => Ok((StatusCode::OK, Json(snapshot))),
        None => Err(session_not_found()),
    }
}

pub async fn previous(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state);
    match service.previous(&session_id).await {
        Some(snapshot) => Ok((StatusCode::OK, Json(snapshot))),
        None => Err(session_not_found()),
    }
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!(session_id = %session_id, "Manual submit");
    let service = SessionService::new(state);
    match service.submit(&session_id).await {
        Some(snapshot) => Ok((StatusCode::OK, Json(snapshot))),
        None => Err(session_not_found()),
    }
}

pub async fn open_review(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state);
    match service.open_review(&session_id).await {
        Some(snapshot) => Ok((StatusCode::OK, Json(snapshot))),
        None => Err(session_not_found()),
    }
}

pub async fn exit_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state);
    if service.discard(&session_id).await {
        Ok((StatusCode::NO_CONTENT, ()))
    } else {
        Err(session_not_found())
    }
}

fn session_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Session not found".to_string())
}

/// Maps the generation failure taxonomy onto HTTP. The parse diagnostic text
/// stays in the logs; the wire only carries the variant and retryability.
fn generation_error_response(err: GenerationError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        GenerationError::PlanRestricted(_) => StatusCode::FORBIDDEN,
        GenerationError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        GenerationError::Network(_)
        | GenerationError::EmptyResponse
        | GenerationError::Parse { .. }
        | GenerationError::Validation => StatusCode::BAD_GATEWAY,
    };
    let code = match err {
        GenerationError::Configuration(_) => "configuration_error",
        GenerationError::Network(_) => "network_error",
        GenerationError::EmptyResponse => "empty_response",
        GenerationError::Parse { .. } => "parse_error",
        GenerationError::Validation => "validation_error",
        GenerationError::PlanRestricted(_) => "plan_restricted",
    };
    let body = json!({
        "error": err.to_string(),
        "code": code,
        "retryable": err.is_retryable(),
    });
    (status, Json(body))
}
