// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    exam::{ExamError, source::DbSource},
    handlers::questions::fetch_question,
    models::{
        question::{CreateQuestionRequest, Question, QuestionRecord, UpdateQuestionRequest},
        user::{AdminLoginRequest, Role},
    },
    state::AppState,
    utils::{html::clean_text, jwt::sign_jwt},
};

/// Signs an admin in through the configured `AdminAuthenticator`.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let subject = state
        .admin_auth
        .authenticate(payload.username.trim(), &payload.password)
        .await
        .inspect_err(|e| tracing::warn!("Admin login rejected: {}", e))?;

    let token = sign_jwt(
        subject,
        Role::Admin,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    tracing::info!(subject, "Admin signed in");
    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": Role::Admin,
    })))
}

/// Lists every question including answers and explanations.
/// Admin only.
pub async fn list_questions(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let questions = DbSource::new(pool, None).fetch_rows().await.map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let records: Vec<QuestionRecord> = questions
        .into_iter()
        .filter_map(|row| Question::try_from(row).ok())
        .map(|q| QuestionRecord::from(&q))
        .collect();

    Ok(Json(records))
}

/// Sanitizes and validates a request, returning the question it describes.
fn prepare(payload: CreateQuestionRequest) -> Result<Question, AppError> {
    let payload = payload.sanitized(clean_text);
    payload.validate()?;
    payload
        .to_question("0")
        .map_err(|e| AppError::from(ExamError::from(e)))
}

/// Creates a new quiz question.
/// Admin only.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = prepare(payload)?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions (kind, level, text, options, correct_answer, explanation)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(question.kind().tag())
    .bind(question.level().as_str())
    .bind(SqlJson(question.prompt().clone()))
    .bind(SqlJson(question.options().to_vec()))
    .bind(question.correct_index().map(|i| i as i64))
    .bind(question.explanation())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let created = fetch_question(&pool, id).await?;
    Ok((StatusCode::CREATED, Json(QuestionRecord::from(&created))))
}

/// Updates a question by ID. Absent fields keep their stored values.
/// Admin only.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current = fetch_question(&pool, id).await?;
    if payload.is_empty() {
        return Ok(Json(QuestionRecord::from(&current)));
    }

    let question = prepare(payload.apply_to(&current))?;

    let result = sqlx::query(
        r#"
        UPDATE questions
        SET kind = $1, level = $2, text = $3, options = $4, correct_answer = $5, explanation = $6
        WHERE id = $7
        "#,
    )
    .bind(question.kind().tag())
    .bind(question.level().as_str())
    .bind(SqlJson(question.prompt().clone()))
    .bind(SqlJson(question.options().to_vec()))
    .bind(question.correct_index().map(|i| i as i64))
    .bind(question.explanation())
    .bind(id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let updated = fetch_question(&pool, id).await?;
    Ok(Json(QuestionRecord::from(&updated)))
}

/// Deletes a question by ID.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
