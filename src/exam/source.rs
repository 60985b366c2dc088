// src/exam/source.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use url::Url;

use crate::{
    exam::error::ExamError,
    models::question::{Level, Question, QuestionRecord, QuestionRow},
};

/// Bundled question list used by `QUESTION_SOURCE=static`.
const BUNDLED_QUESTIONS: &str = include_str!("../../data/questions.json");

#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Loads the ordered question list for one session. Called once per session start.
    async fn load(&self) -> Result<Vec<Question>, ExamError>;
}

/// Parses a JSON array of question records, dropping records that fail validation.
pub fn parse_records(json: &str) -> Result<Vec<Question>, ExamError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(json)
        .map_err(|e| ExamError::SourceUnavailable(format!("malformed question list: {}", e)))?;
    Ok(into_questions(records))
}

fn into_questions(records: Vec<QuestionRecord>) -> Vec<Question> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.to_string();
            Question::try_from(record)
                .inspect_err(|e| tracing::warn!("Skipping invalid question {}: {}", id, e))
                .ok()
        })
        .collect()
}

/// A fixed, in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    questions: Vec<Question>,
}

impl StaticSource {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The list shipped inside the binary.
    pub fn bundled() -> Result<Self, ExamError> {
        parse_records(BUNDLED_QUESTIONS).map(Self::new)
    }

    /// Keeps only questions of `level`.
    pub fn for_level(&self, level: Option<Level>) -> Self {
        match level {
            Some(level) => Self::new(
                self.questions
                    .iter()
                    .filter(|q| q.level() == level)
                    .cloned()
                    .collect(),
            ),
            None => self.clone(),
        }
    }
}

#[async_trait]
impl QuestionSource for StaticSource {
    async fn load(&self) -> Result<Vec<Question>, ExamError> {
        Ok(self.questions.clone())
    }
}

/// Questions from the `questions` table, in insertion order.
#[derive(Debug, Clone)]
pub struct DbSource {
    pool: SqlitePool,
    level: Option<Level>,
}

impl DbSource {
    pub fn new(pool: SqlitePool, level: Option<Level>) -> Self {
        Self { pool, level }
    }

    pub async fn fetch_rows(&self) -> Result<Vec<QuestionRow>, sqlx::Error> {
        let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, kind, level, text, options, correct_answer, explanation, created_at
             FROM questions",
        );
        if let Some(level) = self.level {
            builder.push(" WHERE level = ");
            builder.push_bind(level.as_str());
        }
        builder.push(" ORDER BY id");

        builder.build_query_as::<QuestionRow>().fetch_all(&self.pool).await
    }
}

#[async_trait]
impl QuestionSource for DbSource {
    async fn load(&self) -> Result<Vec<Question>, ExamError> {
        let rows = self.fetch_rows().await.map_err(|e| {
            tracing::error!("Failed to fetch questions: {:?}", e);
            ExamError::SourceUnavailable(e.to_string())
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                Question::try_from(row)
                    .inspect_err(|e| tracing::warn!("Skipping invalid question row {}: {}", id, e))
                    .ok()
            })
            .collect())
    }
}

/// A remote question service answering `GET <url>` (or `GET <url>/level/<level>`)
/// with a JSON array of question records.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, base: &Url, level: Option<Level>, timeout: Duration) -> Self {
        let mut url = base.clone();
        if let Some(level) = level {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().extend(["level", level.as_str()]);
            }
        }
        Self {
            client,
            url,
            timeout,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl QuestionSource for HttpSource {
    async fn load(&self) -> Result<Vec<Question>, ExamError> {
        let response = self
            .client
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::warn!("Question service request to {} failed: {}", self.url, e);
                ExamError::SourceUnavailable(e.to_string())
            })?;

        let records: Vec<QuestionRecord> = response.json().await.map_err(|e| {
            tracing::warn!("Question service returned an unreadable body: {}", e);
            ExamError::SourceUnavailable(e.to_string())
        })?;

        Ok(into_questions(records))
    }
}
