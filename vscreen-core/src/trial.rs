use serde::{Deserialize, Serialize};

use crate::response::Response;
use crate::stimulus::Stimulus;

/// Transient cue shown after a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Correct,
    Incorrect,
    /// Neutral acknowledgement for questionnaire-style tests.
    Recorded,
}

impl Feedback {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Feedback::Correct
        } else {
            Feedback::Incorrect
        }
    }
}

/// Recorded stimulus-response pair. Never mutated once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub index: usize,
    pub level: u32,
    pub stimulus: Stimulus,
    pub expected: Response,
    pub actual: Response,
    pub correct: bool,
    pub presented_at_ns: u64,
    pub responded_at_ns: u64,
}

impl Trial {
    pub fn response_time_ns(&self) -> u64 {
        self.responded_at_ns.saturating_sub(self.presented_at_ns)
    }
}

/// Outcome of one difficulty level once its trial quota is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    pub level: u32,
    pub correct: u32,
    pub total: u32,
    pub passed: bool,
}

impl LevelResult {
    pub fn evaluate(level: u32, correct: u32, total: u32, min_correct: u32) -> Self {
        Self {
            level,
            correct,
            total,
            passed: correct >= min_correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_of_three_passes_acuity_threshold() {
        assert!(LevelResult::evaluate(1, 2, 3, 2).passed);
        assert!(!LevelResult::evaluate(1, 1, 3, 2).passed);
    }

    #[test]
    fn response_time_saturates() {
        let trial = Trial {
            index: 0,
            level: 1,
            stimulus: Stimulus::ClockDial { lines: 12 },
            expected: Response::Digits("1".into()),
            actual: Response::Digits("1".into()),
            correct: true,
            presented_at_ns: 500,
            responded_at_ns: 200,
        };
        assert_eq!(trial.response_time_ns(), 0);
    }
}
