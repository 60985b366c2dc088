// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    exam::{registry::LiveSession, result::ResultView, store::AttemptStore},
    models::{answer::Answer, question::Level},
    state::AppState,
    utils::jwt::Capability,
};

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    pub level: Option<Level>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: Answer,
}

fn find(state: &AppState, id: Uuid, capability: &Capability) -> Result<Arc<LiveSession>, AppError> {
    state
        .sessions
        .get(id, capability.user_id)
        .ok_or(AppError::NotFound("Session not found".to_string()))
}

/// Starts a timed test for the caller.
///
/// Questions are loaded once from the configured source. If they cannot be
/// loaded the caller gets 503 and no session or timer is created.
pub async fn start_session(
    State(state): State<AppState>,
    Extension(capability): Extension<Capability>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let source = state.question_source(payload.level);
    let store: Arc<dyn AttemptStore> = state.attempts.clone();

    let session = LiveSession::start(
        capability.user_id,
        state.config.test_duration_secs,
        source.as_ref(),
        Some(store),
    )
    .await?;

    let snapshot = session.snapshot();
    state.sessions.insert(session);

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Current state of a session: position, remaining time and the open question.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(capability): Extension<Capability>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find(&state, id, &capability)?;
    Ok(Json(session.snapshot()))
}

/// Answers the current question and moves on. After submission this is a no-op
/// that returns the submitted snapshot.
pub async fn answer(
    State(state): State<AppState>,
    Extension(capability): Extension<Capability>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = find(&state, id, &capability)?;
    Ok(Json(session.answer(payload.answer)))
}

/// The handed-off result, or a "no results" view when there is none.
pub async fn get_result(
    State(state): State<AppState>,
    Extension(capability): Extension<Capability>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let result = state
        .sessions
        .get(id, capability.user_id)
        .and_then(|s| s.result());
    Json(ResultView::present(result))
}

/// Abandons a session: stops its clock and forgets it.
pub async fn abandon(
    State(state): State<AppState>,
    Extension(capability): Extension<Capability>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .sessions
        .remove(id, capability.user_id)
        .ok_or(AppError::NotFound("Session not found".to_string()))?;
    session.abandon();
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's saved attempts, newest first.
pub async fn list_attempts(
    State(state): State<AppState>,
    Extension(capability): Extension<Capability>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = state
        .attempts
        .list_for_user(capability.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list attempts: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    Ok(Json(attempts))
}
