// src/exam/error.rs

use thiserror::Error;

use crate::models::question::QuestionError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExamError {
    /// The question source could not produce a usable question list.
    #[error("question source unavailable: {0}")]
    SourceUnavailable(String),
    /// A best-effort attempt save failed.
    #[error("failed to persist attempt: {0}")]
    PersistenceFailed(String),
    /// An answer arrived after the session left the in-progress state.
    #[error("session no longer accepts answers")]
    InvalidAnswerState,
    #[error(transparent)]
    InvalidQuestion(#[from] QuestionError),
}
