// src/exam/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqlitePool, types::Json};

use crate::{
    exam::{error::ExamError, scorer::ScoreResult},
    models::{answer::AnswerSet, exam_record::AttemptRow},
};

/// What gets saved after a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub user_id: i64,
    pub score: u32,
    pub percent: u8,
    pub total_graded: u32,
    pub answers: AnswerSet,
    pub created_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(user_id: i64, result: &ScoreResult, answers: AnswerSet) -> Self {
        Self {
            user_id,
            score: result.score,
            percent: result.percent,
            total_graded: result.total_graded,
            answers,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn save(&self, record: &AttemptRecord) -> Result<(), ExamError>;
}

#[derive(Debug, Clone)]
pub struct SqliteAttemptStore {
    pool: SqlitePool,
}

impl SqliteAttemptStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Saved attempts of `user_id`, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<AttemptRow>, sqlx::Error> {
        sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT id, user_id, score, percent, total_graded, answers, created_at
            FROM attempts
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl AttemptStore for SqliteAttemptStore {
    async fn save(&self, record: &AttemptRecord) -> Result<(), ExamError> {
        sqlx::query(
            r#"
            INSERT INTO attempts (user_id, score, percent, total_graded, answers, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.user_id)
        .bind(i64::from(record.score))
        .bind(i64::from(record.percent))
        .bind(i64::from(record.total_graded))
        .bind(Json(record.answers.clone()))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ExamError::PersistenceFailed(e.to_string()))?;

        Ok(())
    }
}
