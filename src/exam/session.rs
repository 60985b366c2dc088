// src/exam/session.rs

use crate::exam::{
    error::ExamError,
    scorer::{self, ScoreResult},
};
use crate::models::{
    answer::{Answer, AnswerSet},
    question::Question,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    /// Loading failed; sibling of `Loading`, never followed by `InProgress`.
    Failed(String),
    InProgress,
    Submitting,
    Submitted,
}

impl SessionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Loading => "loading",
            SessionPhase::Failed(_) => "failed",
            SessionPhase::InProgress => "in_progress",
            SessionPhase::Submitting => "submitting",
            SessionPhase::Submitted => "submitted",
        }
    }
}

/// What an input did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Pointer moved to the given question.
    Advanced(usize),
    /// The session is now `Submitting`; the caller must call `submit`.
    ReadyToSubmit,
    /// Input arrived in a phase that does not accept it.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct TestSession {
    phase: SessionPhase,
    questions: Vec<Question>,
    answers: Option<AnswerSet>,
    pointer: usize,
    duration_secs: u64,
    remaining_secs: u64,
    result: Option<ScoreResult>,
}

impl TestSession {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            phase: SessionPhase::Loading,
            questions: Vec::new(),
            answers: None,
            pointer: 0,
            duration_secs,
            remaining_secs: duration_secs,
            result: None,
        }
    }

    /// Consumes the loader result. An error or an empty list moves to `Failed`
    /// without allocating an answer set.
    pub fn begin(&mut self, loaded: Result<Vec<Question>, ExamError>) -> Result<(), ExamError> {
        if self.phase != SessionPhase::Loading {
            return Err(ExamError::InvalidAnswerState);
        }

        let questions = loaded
            .and_then(|qs| {
                if qs.is_empty() {
                    Err(ExamError::SourceUnavailable("no questions available".to_string()))
                } else {
                    Ok(qs)
                }
            })
            .inspect_err(|e| self.phase = SessionPhase::Failed(e.to_string()))?;

        self.answers = Some(AnswerSet::unanswered(questions.len()));
        self.questions = questions;
        self.pointer = 0;
        self.phase = SessionPhase::InProgress;
        Ok(())
    }

    /// Records `answer` for the current question and advances, or moves to
    /// `Submitting` after the last one. Rejected without side effects outside
    /// `InProgress`.
    pub fn answer(&mut self, answer: Answer) -> Result<Step, ExamError> {
        if self.phase != SessionPhase::InProgress {
            return Err(ExamError::InvalidAnswerState);
        }
        let answers = self.answers.as_mut().ok_or(ExamError::InvalidAnswerState)?;
        answers.record(self.pointer, answer);

        if self.pointer + 1 < self.questions.len() {
            self.pointer += 1;
            Ok(Step::Advanced(self.pointer))
        } else {
            self.phase = SessionPhase::Submitting;
            Ok(Step::ReadyToSubmit)
        }
    }

    /// Applies a countdown tick. Remaining time never increases.
    pub fn tick(&mut self, remaining_secs: u64) {
        if self.phase == SessionPhase::InProgress {
            self.remaining_secs = self.remaining_secs.min(remaining_secs);
        }
    }

    /// Time is up: submit with whatever has been answered.
    pub fn expire(&mut self) -> Step {
        if self.phase != SessionPhase::InProgress {
            return Step::Ignored;
        }
        self.remaining_secs = 0;
        self.phase = SessionPhase::Submitting;
        Step::ReadyToSubmit
    }

    /// Scores the attempt. Returns the result only on the `Submitting → Submitted`
    /// transition; every later call yields `None`.
    pub fn submit(&mut self) -> Option<ScoreResult> {
        if self.phase != SessionPhase::Submitting {
            return None;
        }
        let answers = self.answers.as_ref()?;
        let result = scorer::score(answers, &self.questions);
        self.result = Some(result);
        self.phase = SessionPhase::Submitted;
        Some(result)
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The question awaiting an answer, if the session is in progress.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::InProgress => self.questions.get(self.pointer),
            _ => None,
        }
    }

    pub fn answers(&self) -> Option<&AnswerSet> {
        self.answers.as_ref()
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn result(&self) -> Option<ScoreResult> {
        self.result
    }
}
