// src/models/exam_record.rs

use serde::Serialize;
use sqlx::{FromRow, types::Json};

use crate::models::answer::AnswerSet;

/// Represents the 'attempts' table in the database.
/// Stores the results of finished test sessions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttemptRow {
    pub id: i64,
    pub user_id: i64,
    pub score: i64,
    pub percent: i64,
    pub total_graded: i64,
    pub answers: Json<AnswerSet>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
