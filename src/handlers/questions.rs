// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    exam::source::{DbSource, QuestionSource},
    models::question::{Level, PublicQuestion, Question, QuestionRow},
};

async fn public_questions(
    pool: SqlitePool,
    level: Option<Level>,
) -> Result<Vec<PublicQuestion>, AppError> {
    let questions = DbSource::new(pool, level).load().await?;
    Ok(questions.iter().map(PublicQuestion::from).collect())
}

/// Lists all questions without their answers.
pub async fn list_questions(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(public_questions(pool, None).await?))
}

/// Lists the questions of one level without their answers.
pub async fn list_by_level(
    State(pool): State<SqlitePool>,
    Path(level): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let level = level
        .parse::<Level>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(public_questions(pool, Some(level)).await?))
}

/// Loads one stored question by id.
pub async fn fetch_question(pool: &SqlitePool, id: i64) -> Result<Question, AppError> {
    let row = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, kind, level, text, options, correct_answer, explanation, created_at
        FROM questions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch question {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Question::try_from(row).map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Returns one question without its answer.
pub async fn get_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = fetch_question(&pool, id).await?;
    Ok(Json(PublicQuestion::from(&question)))
}
