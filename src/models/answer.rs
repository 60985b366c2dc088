// src/models/answer.rs

use serde::{Deserialize, Serialize};

/// A single response: an option index for choice questions or free text.
/// On the wire this is a bare JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Choice(usize),
    Text(String),
}

impl Answer {
    pub fn as_choice(&self) -> Option<usize> {
        match self {
            Answer::Choice(i) => Some(*i),
            Answer::Text(_) => None,
        }
    }
}

/// One slot per question, `None` meaning unanswered. Serializes as
/// `[1, "text", null, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(Vec<Option<Answer>>);

impl AnswerSet {
    /// All slots unanswered.
    pub fn unanswered(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Answer> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// Writes `answer` into slot `index`; out-of-range writes are ignored.
    pub fn record(&mut self, index: usize, answer: Answer) -> bool {
        match self.0.get_mut(index) {
            Some(slot) => {
                *slot = Some(answer);
                true
            }
            None => false,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_some()).count()
    }

    pub fn slots(&self) -> &[Option<Answer>] {
        &self.0
    }
}

impl From<Vec<Option<Answer>>> for AnswerSet {
    fn from(slots: Vec<Option<Answer>>) -> Self {
        Self(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_number_string_or_null() {
        let mut set = AnswerSet::unanswered(3);
        set.record(0, Answer::Choice(2));
        set.record(2, Answer::Text("because".to_string()));
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"[2,null,"because"]"#);

        let parsed: AnswerSet = serde_json::from_str(r#"[2,null,"because"]"#).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn record_out_of_range_is_ignored() {
        let mut set = AnswerSet::unanswered(1);
        assert!(!set.record(1, Answer::Choice(0)));
        assert_eq!(set.answered_count(), 0);
    }
}
