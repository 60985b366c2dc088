// src/exam/scorer.rs

use serde::{Deserialize, Serialize};

use crate::models::{answer::AnswerSet, question::Question};

/// Qualitative label derived from the percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Weak,
    Medium,
    High,
}

impl Band {
    /// `[0, 40)` weak, `[40, 70)` medium, `[70, 100]` high.
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0..40 => Band::Weak,
            40..70 => Band::Medium,
            _ => Band::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Band::Weak => "weak",
            Band::Medium => "medium",
            Band::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Number of correctly answered choice questions.
    pub score: u32,
    /// `round(100 * score / total_graded)`, 0 when nothing is graded.
    pub percent: u8,
    pub total_graded: u32,
    pub band: Band,
}

/// Scores `answers` against `questions`, slot by slot.
///
/// Freeform questions are ignored entirely. A choice slot is correct only when it
/// holds an option index equal to the question's correct index; text never matches.
pub fn score(answers: &AnswerSet, questions: &[Question]) -> ScoreResult {
    let mut correct = 0u32;
    let mut graded = 0u32;

    for (index, question) in questions.iter().enumerate() {
        let Some(expected) = question.correct_index() else {
            continue;
        };
        graded += 1;
        if answers.get(index).and_then(|a| a.as_choice()) == Some(expected) {
            correct += 1;
        }
    }

    let percent = percent_of(correct, graded);
    ScoreResult {
        score: correct,
        percent,
        total_graded: graded,
        band: Band::from_percent(percent),
    }
}

/// Integer round-half-up of `100 * part / whole`.
fn percent_of(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    ((200 * part + whole) / (2 * whole)).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::Answer;

    fn choice(id: &str, correct: i64) -> Question {
        let options = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        Question::choice(id, "Q", options, correct).unwrap()
    }

    #[test]
    fn scores_two_of_three() {
        let questions = vec![choice("1", 1), choice("2", 0), choice("3", 2)];
        let answers = AnswerSet::from(vec![
            Some(Answer::Choice(1)),
            Some(Answer::Choice(0)),
            Some(Answer::Choice(1)),
        ]);

        let result = score(&answers, &questions);
        assert_eq!(result.score, 2);
        assert_eq!(result.percent, 67);
        assert_eq!(result.total_graded, 3);
        assert_eq!(result.band, Band::Medium);
    }

    #[test]
    fn unanswered_attempt_is_weak_zero() {
        let questions = vec![choice("1", 1), choice("2", 0), choice("3", 2)];
        let result = score(&AnswerSet::unanswered(3), &questions);
        assert_eq!((result.score, result.percent, result.band), (0, 0, Band::Weak));
    }

    #[test]
    fn no_graded_questions_means_zero_percent() {
        let questions = vec![Question::freeform("1", "Why?"), Question::freeform("2", "How?")];
        let answers = AnswerSet::from(vec![Some(Answer::Text("x".into())), None]);
        let result = score(&answers, &questions);
        assert_eq!(result.percent, 0);
        assert_eq!(result.total_graded, 0);
        assert_eq!(score(&AnswerSet::default(), &[]).percent, 0);
    }

    #[test]
    fn freeform_questions_do_not_count() {
        let questions = vec![choice("1", 0), Question::freeform("2", "Why?")];
        let answers = AnswerSet::from(vec![Some(Answer::Choice(0)), Some(Answer::Text("0".into()))]);
        let result = score(&answers, &questions);
        assert_eq!((result.score, result.total_graded, result.percent), (1, 1, 100));
        assert_eq!(result.band, Band::High);
    }

    #[test]
    fn text_never_matches_an_index() {
        let questions = vec![choice("1", 1)];
        let answers = AnswerSet::from(vec![Some(Answer::Text("1".into()))]);
        assert_eq!(score(&answers, &questions).score, 0);
    }

    #[test]
    fn scoring_is_pure() {
        let questions = vec![choice("1", 1), choice("2", 3)];
        let answers = AnswerSet::from(vec![Some(Answer::Choice(1)), None]);
        let (q_before, a_before) = (questions.clone(), answers.clone());

        let first = score(&answers, &questions);
        let second = score(&answers, &questions);
        assert_eq!(first, second);
        assert_eq!(questions, q_before);
        assert_eq!(answers, a_before);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(Band::from_percent(0), Band::Weak);
        assert_eq!(Band::from_percent(39), Band::Weak);
        assert_eq!(Band::from_percent(40), Band::Medium);
        assert_eq!(Band::from_percent(69), Band::Medium);
        assert_eq!(Band::from_percent(70), Band::High);
        assert_eq!(Band::from_percent(100), Band::High);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(1, 8), 13);
        assert_eq!(percent_of(3, 3), 100);
    }
}
