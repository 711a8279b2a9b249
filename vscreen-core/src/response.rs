use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::stimulus::{Bearing, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
}

/// Astigmatism dial selection: the clock hour of the darkest line, or all
/// lines looking equally dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockChoice {
    Line(u8),
    AllEqual,
}

/// A discrete answer delivered by the input surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Response {
    Direction(Direction),
    Letter(char),
    Digits(String),
    Answer(Answer),
    Clock(ClockChoice),
    /// Where the flash was seen; `None` when it was not seen.
    Peripheral(Option<Bearing>),
}

impl Response {
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            Response::Letter(c) if !c.is_ascii_alphabetic() => Err(EngineError::InvalidResponse(
                format!("'{c}' is not a letter"),
            )),
            Response::Digits(d) => {
                let d = d.trim();
                if d.is_empty() {
                    Err(EngineError::InvalidResponse("empty plate answer".into()))
                } else if !d.chars().all(|c| c.is_ascii_digit()) {
                    Err(EngineError::InvalidResponse(format!(
                        "plate answer '{d}' is not a number"
                    )))
                } else {
                    Ok(())
                }
            }
            Response::Clock(ClockChoice::Line(hour)) if !(1..=12).contains(hour) => Err(
                EngineError::InvalidResponse(format!("clock hour {hour} out of range 1..=12")),
            ),
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Response::Direction(_) => "direction",
            Response::Letter(_) => "letter",
            Response::Digits(_) => "digits",
            Response::Answer(_) => "answer",
            Response::Clock(_) => "clock",
            Response::Peripheral(_) => "peripheral",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_non_numeric_digits_are_rejected() {
        assert!(Response::Digits("   ".into()).validate().is_err());
        assert!(Response::Digits("1a".into()).validate().is_err());
        assert!(Response::Digits("74".into()).validate().is_ok());
    }

    #[test]
    fn clock_hours_outside_dial_are_rejected() {
        assert!(Response::Clock(ClockChoice::Line(0)).validate().is_err());
        assert!(Response::Clock(ClockChoice::Line(13)).validate().is_err());
        assert!(Response::Clock(ClockChoice::Line(12)).validate().is_ok());
        assert!(Response::Clock(ClockChoice::AllEqual).validate().is_ok());
    }

    #[test]
    fn non_letters_are_rejected() {
        assert!(Response::Letter('7').validate().is_err());
        assert!(Response::Letter('z').validate().is_ok());
    }
}
