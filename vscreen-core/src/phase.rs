use serde::{Deserialize, Serialize};

use crate::test_type::TestType;

/// Lifecycle of a single test session.
///
/// `EyeSelection -> Instructions -> Running -> {Feedback -> Running | Complete}`,
/// with `Running -> Instructions|EyeSelection` on exit and any status
/// `-> Exited` when the host discards the session.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    EyeSelection,
    Instructions,
    Running,
    Feedback,
    Complete,
    Exited,
}

impl SessionStatus {
    /// First status of a fresh session for `test_type`.
    pub fn entry_for(test_type: TestType) -> Self {
        if test_type.is_two_eye() {
            SessionStatus::EyeSelection
        } else {
            SessionStatus::Instructions
        }
    }

    pub fn allows_input(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// A stimulus is on screen (or between trials during feedback).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Feedback)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Exited)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EyeSelection => "eye_selection",
            Self::Instructions => "instructions",
            Self::Running => "running",
            Self::Feedback => "feedback",
            Self::Complete => "complete",
            Self::Exited => "exited",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_eye_tests_enter_at_eye_selection() {
        assert_eq!(
            SessionStatus::entry_for(TestType::Astigmatism),
            SessionStatus::EyeSelection
        );
        assert_eq!(
            SessionStatus::entry_for(TestType::ColorVision),
            SessionStatus::Instructions
        );
    }

    #[test]
    fn only_running_accepts_input() {
        assert!(SessionStatus::Running.allows_input());
        assert!(!SessionStatus::Feedback.allows_input());
        assert!(SessionStatus::Feedback.is_active());
        assert!(SessionStatus::Exited.is_terminal());
        assert!(!SessionStatus::Instructions.is_terminal());
    }
}
