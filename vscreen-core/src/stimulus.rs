use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::response::{Answer, ClockChoice, Response};

/// What the host renders for the current trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stimulus {
    /// Tumbling E optotype on one Snellen line.
    TumblingE {
        direction: Direction,
        snellen_denominator: u16,
        size_arcmin: f32,
    },
    /// Sloan letter faded to `contrast` (Weber, 0..=1).
    ContrastLetter {
        letter: char,
        log_cs: f32,
        contrast: f32,
    },
    /// Pseudo-isochromatic plate; `number` is 1-based.
    Plate { number: u8, digits: String },
    AmslerQuestion { question: AmslerQuestion },
    /// Astigmatism clock dial with `lines` radial line groups.
    ClockDial { lines: u8 },
    PeripheralFlash {
        bearing: Bearing,
        eccentricity_deg: f32,
    },
}

/// Direction the tumbling E's bars point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Compass position of a peripheral flash relative to the fixation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bearing {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Bearing {
    pub const ALL: [Bearing; 8] = [
        Bearing::North,
        Bearing::NorthEast,
        Bearing::East,
        Bearing::SouthEast,
        Bearing::South,
        Bearing::SouthWest,
        Bearing::West,
        Bearing::NorthWest,
    ];

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Bearing::North => "n",
            Bearing::NorthEast => "ne",
            Bearing::East => "e",
            Bearing::SouthEast => "se",
            Bearing::South => "s",
            Bearing::SouthWest => "sw",
            Bearing::West => "w",
            Bearing::NorthWest => "nw",
        }
    }

    pub fn from_abbreviation(s: &str) -> Option<Bearing> {
        let s = s.trim().to_ascii_lowercase();
        Bearing::ALL.into_iter().find(|b| b.abbreviation() == s)
    }
}

/// Amsler grid questions. Each is phrased so that "yes" reports a distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmslerQuestion {
    WavyLines,
    MissingAreas,
    BlurredRegions,
    UnevenSquares,
}

impl AmslerQuestion {
    pub const ALL: [AmslerQuestion; 4] = [
        AmslerQuestion::WavyLines,
        AmslerQuestion::MissingAreas,
        AmslerQuestion::BlurredRegions,
        AmslerQuestion::UnevenSquares,
    ];

    pub fn prompt(&self) -> &'static str {
        match self {
            AmslerQuestion::WavyLines => "Do any of the lines look wavy, bent or distorted?",
            AmslerQuestion::MissingAreas => "Are any parts of the grid missing or dark?",
            AmslerQuestion::BlurredRegions => "Do any areas of the grid look blurry?",
            AmslerQuestion::UnevenSquares => "Do any squares look a different size or shape?",
        }
    }
}

impl Stimulus {
    /// The response that counts as correct, or the "normal" answer for
    /// questionnaire-style stimuli.
    pub fn expected_response(&self) -> Response {
        match self {
            Stimulus::TumblingE { direction, .. } => Response::Direction(*direction),
            Stimulus::ContrastLetter { letter, .. } => Response::Letter(*letter),
            Stimulus::Plate { digits, .. } => Response::Digits(digits.clone()),
            Stimulus::AmslerQuestion { .. } => Response::Answer(Answer::No),
            Stimulus::ClockDial { .. } => Response::Clock(ClockChoice::AllEqual),
            Stimulus::PeripheralFlash { bearing, .. } => Response::Peripheral(Some(*bearing)),
        }
    }

    /// Compares `response` against the expected one.
    ///
    /// Fails with [`EngineError::InvalidResponse`] when the response is
    /// malformed or belongs to a different kind of stimulus.
    pub fn judge(&self, response: &Response) -> Result<bool, EngineError> {
        response.validate()?;
        let correct = match (self, response) {
            (Stimulus::TumblingE { direction, .. }, Response::Direction(d)) => direction == d,
            (Stimulus::ContrastLetter { letter, .. }, Response::Letter(l)) => {
                letter.eq_ignore_ascii_case(l)
            }
            (Stimulus::Plate { digits, .. }, Response::Digits(d)) => {
                digits.trim_start_matches('0') == d.trim().trim_start_matches('0')
            }
            (Stimulus::AmslerQuestion { .. }, Response::Answer(a)) => *a == Answer::No,
            (Stimulus::ClockDial { .. }, Response::Clock(c)) => *c == ClockChoice::AllEqual,
            (Stimulus::PeripheralFlash { bearing, .. }, Response::Peripheral(seen)) => {
                *seen == Some(*bearing)
            }
            (stimulus, response) => {
                return Err(EngineError::InvalidResponse(format!(
                    "{} response does not answer a {} stimulus",
                    response.kind(),
                    stimulus.kind()
                )));
            }
        };
        Ok(correct)
    }

    /// Response recorded when the response window lapses without input.
    pub fn timeout_response(&self) -> Option<Response> {
        match self {
            Stimulus::PeripheralFlash { .. } => Some(Response::Peripheral(None)),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Stimulus::TumblingE { .. } => "tumbling_e",
            Stimulus::ContrastLetter { .. } => "contrast_letter",
            Stimulus::Plate { .. } => "plate",
            Stimulus::AmslerQuestion { .. } => "amsler_question",
            Stimulus::ClockDial { .. } => "clock_dial",
            Stimulus::PeripheralFlash { .. } => "peripheral_flash",
        }
    }
}
