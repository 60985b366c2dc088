// src/models/question.rs

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use thiserror::Error;
use validator::Validate;

/// Errors raised while building a `Question` from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("a choice question needs at least one option")]
    EmptyOptions,
    #[error("correct answer {index} is out of bounds for {len} options")]
    CorrectIndexOutOfBounds { index: i64, len: usize },
    #[error("a choice question needs a correct answer")]
    MissingCorrectAnswer,
    #[error("unknown question kind '{0}'")]
    UnknownKind(String),
    #[error("unknown level '{0}'")]
    UnknownLevel(String),
}

/// Difficulty level a question belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(QuestionError::UnknownLevel(other.to_string())),
        }
    }
}

/// Prompt text, either a single string or one string per locale (`{"ru": .., "ky": ..}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl Prompt {
    /// Text for `locale`, falling back to the first available translation.
    pub fn resolve(&self, locale: Option<&str>) -> &str {
        match self {
            Prompt::Plain(text) => text,
            Prompt::Localized(map) => locale
                .and_then(|l| map.get(l))
                .or_else(|| map.values().next())
                .map(String::as_str)
                .unwrap_or(""),
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        match self {
            Prompt::Plain(text) => vec![text.as_str()],
            Prompt::Localized(map) => map.values().map(String::as_str).collect(),
        }
    }

    /// Applies `f` to every translation.
    pub fn map_texts(self, f: impl Fn(&str) -> String) -> Self {
        match self {
            Prompt::Plain(text) => Prompt::Plain(f(&text)),
            Prompt::Localized(map) => {
                Prompt::Localized(map.into_iter().map(|(k, v)| (k, f(&v))).collect())
            }
        }
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Plain(text.to_string())
    }
}

/// Graded multiple-choice question or ungraded free-text question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Choice {
        options: Vec<String>,
        correct_index: usize,
    },
    Freeform,
}

impl QuestionKind {
    pub fn tag(&self) -> &'static str {
        match self {
            QuestionKind::Choice { .. } => "choice",
            QuestionKind::Freeform => "freeform",
        }
    }
}

/// A question as the exam core sees it. Only constructible through validating
/// constructors, so a choice question always has options and an in-bounds answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: String,
    level: Level,
    prompt: Prompt,
    explanation: Option<String>,
    kind: QuestionKind,
}

impl Question {
    pub fn choice(
        id: impl Into<String>,
        prompt: impl Into<Prompt>,
        options: Vec<String>,
        correct_index: i64,
    ) -> Result<Self, QuestionError> {
        if options.is_empty() {
            return Err(QuestionError::EmptyOptions);
        }
        let correct_index = usize::try_from(correct_index)
            .ok()
            .filter(|i| *i < options.len())
            .ok_or(QuestionError::CorrectIndexOutOfBounds {
                index: correct_index,
                len: options.len(),
            })?;

        Ok(Self {
            id: id.into(),
            level: Level::default(),
            prompt: prompt.into(),
            explanation: None,
            kind: QuestionKind::Choice {
                options,
                correct_index,
            },
        })
    }

    pub fn freeform(id: impl Into<String>, prompt: impl Into<Prompt>) -> Self {
        Self {
            id: id.into(),
            level: Level::default(),
            prompt: prompt.into(),
            explanation: None,
            kind: QuestionKind::Freeform,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_explanation(mut self, explanation: Option<String>) -> Self {
        self.explanation = explanation.filter(|e| !e.trim().is_empty());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    /// Only choice questions count towards the score.
    pub fn is_graded(&self) -> bool {
        matches!(self.kind, QuestionKind::Choice { .. })
    }

    pub fn correct_index(&self) -> Option<usize> {
        match &self.kind {
            QuestionKind::Choice { correct_index, .. } => Some(*correct_index),
            QuestionKind::Freeform => None,
        }
    }

    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::Choice { options, .. } => options,
            QuestionKind::Freeform => &[],
        }
    }
}

/// Record id as it appears on the wire: remote services use strings, the database integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Text(String),
    Number(i64),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Text(s) => f.write_str(s),
            RecordId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Wire format of a full question record (HTTP sources, bundled list, admin API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: RecordId,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub text: Prompt,
    #[serde(default)]
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, alias = "correctIndex", skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Maps the kind tags seen in question data onto `is_choice`.
fn parse_kind(kind: Option<&str>, has_options: bool) -> Result<bool, QuestionError> {
    match kind.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(has_options),
        Some("choice") | Some("logic") | Some("single") => Ok(true),
        Some("freeform") | Some("motivation") | Some("text") => Ok(false),
        Some(other) => Err(QuestionError::UnknownKind(other.to_string())),
    }
}

fn build_question(
    id: String,
    kind: Option<&str>,
    prompt: Prompt,
    level: Level,
    options: Option<Vec<String>>,
    correct_answer: Option<i64>,
    explanation: Option<String>,
) -> Result<Question, QuestionError> {
    let has_options = options.as_ref().is_some_and(|o| !o.is_empty());
    let question = if parse_kind(kind, has_options)? {
        let correct = correct_answer.ok_or(QuestionError::MissingCorrectAnswer)?;
        Question::choice(id, prompt, options.unwrap_or_default(), correct)?
    } else {
        Question::freeform(id, prompt)
    };

    Ok(question.with_level(level).with_explanation(explanation))
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        build_question(
            record.id.to_string(),
            record.kind.as_deref(),
            record.text,
            record.level,
            record.options,
            record.correct_answer,
            record.explanation,
        )
    }
}

impl From<&Question> for QuestionRecord {
    fn from(q: &Question) -> Self {
        let id = q
            .id
            .parse::<i64>()
            .map(RecordId::Number)
            .unwrap_or_else(|_| RecordId::Text(q.id.clone()));

        Self {
            id,
            kind: Some(q.kind.tag().to_string()),
            text: q.prompt.clone(),
            level: q.level,
            options: q.is_graded().then(|| q.options().to_vec()),
            correct_answer: q.correct_index().map(|i| i as i64),
            explanation: q.explanation.clone(),
        }
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub kind: String,
    pub level: String,
    /// Prompt stored as JSON so localized prompts survive a round trip.
    pub text: Json<Prompt>,
    pub options: Json<Vec<String>>,
    pub correct_answer: Option<i64>,
    pub explanation: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = QuestionError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        build_question(
            row.id.to_string(),
            Some(&row.kind),
            row.text.0,
            row.level.parse()?,
            Some(row.options.0),
            row.correct_answer,
            row.explanation,
        )
    }
}

/// DTO for sending a question to test takers (excludes answer and explanation).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub kind: &'static str,
    pub text: Prompt,
    pub level: Level,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            kind: q.kind.tag(),
            text: q.prompt.clone(),
            level: q.level,
            options: q.options().to_vec(),
        }
    }
}

/// DTO for creating a question from the admin panel.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[validate(custom(function = validate_prompt))]
    pub text: Prompt,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    pub correct_answer: Option<i64>,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

impl CreateQuestionRequest {
    /// Builds the domain question; `id` is assigned by storage.
    pub fn to_question(&self, id: impl Into<String>) -> Result<Question, QuestionError> {
        build_question(
            id.into(),
            self.kind.as_deref(),
            self.text.clone(),
            self.level,
            Some(self.options.clone()),
            self.correct_answer,
            self.explanation.clone(),
        )
    }

    /// Runs every user-provided string through `clean`.
    pub fn sanitized(self, clean: impl Fn(&str) -> String) -> Self {
        Self {
            text: self.text.map_texts(&clean),
            options: self.options.iter().map(|o| clean(o)).collect(),
            explanation: self.explanation.as_deref().map(&clean),
            ..self
        }
    }
}

/// DTO for updating a question. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    pub text: Option<Prompt>,
    pub level: Option<Level>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<i64>,
    pub explanation: Option<String>,
}

impl UpdateQuestionRequest {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.text.is_none()
            && self.level.is_none()
            && self.options.is_none()
            && self.correct_answer.is_none()
            && self.explanation.is_none()
    }

    /// Overlays this patch on an existing question, yielding a full request to validate.
    pub fn apply_to(self, current: &Question) -> CreateQuestionRequest {
        CreateQuestionRequest {
            kind: self.kind.or_else(|| Some(current.kind.tag().to_string())),
            text: self.text.unwrap_or_else(|| current.prompt.clone()),
            level: self.level.unwrap_or(current.level),
            options: self.options.unwrap_or_else(|| current.options().to_vec()),
            correct_answer: self
                .correct_answer
                .or_else(|| current.correct_index().map(|i| i as i64)),
            explanation: self.explanation.or_else(|| current.explanation.clone()),
        }
    }
}

fn validate_prompt(prompt: &Prompt) -> Result<(), validator::ValidationError> {
    let texts = prompt.texts();
    if texts.is_empty() || texts.iter().any(|t| t.trim().is_empty()) {
        return Err(validator::ValidationError::new("text_cannot_be_empty"));
    }
    if texts.iter().any(|t| t.chars().count() > 1000) {
        return Err(validator::ValidationError::new("text_too_long"));
    }
    Ok(())
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    // Freeform questions carry no options; choice questions need at least two.
    if options.len() == 1 || options.len() > 6 {
        return Err(validator::ValidationError::new("options_count"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.chars().count() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
