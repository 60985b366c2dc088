// src/exam/mod.rs

pub mod error;
pub mod registry;
pub mod result;
pub mod scorer;
pub mod session;
pub mod source;
pub mod store;
pub mod timer;

pub use error::ExamError;
pub use registry::{LiveSession, SessionRegistry};
pub use scorer::{Band, ScoreResult, score};
pub use session::{SessionPhase, Step, TestSession};
pub use source::QuestionSource;
pub use timer::{CountdownTimer, TimerListener};
