// src/exam/result.rs

use serde::Serialize;

use crate::exam::scorer::{Band, ScoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultView {
    Scored {
        score: u32,
        percent: u8,
        total_graded: u32,
        band: Band,
    },
    /// Nothing was handed off (unknown session, not submitted yet).
    NoResults,
}

impl ResultView {
    pub fn present(payload: Option<ScoreResult>) -> Self {
        match payload {
            Some(result) => ResultView::Scored {
                score: result.score,
                percent: result.percent,
                total_graded: result.total_graded,
                band: Band::from_percent(result.percent),
            },
            None => ResultView::NoResults,
        }
    }
}
