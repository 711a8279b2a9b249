use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stimulus::{AmslerQuestion, Bearing};
use crate::test_type::{Eye, TestType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Normal,
    Concerns,
}

/// Test-specific summary value of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum Summary {
    /// `None` when not even the largest line was read.
    VisualAcuity {
        snellen_denominator: Option<u16>,
        logmar: Option<f32>,
    },
    ContrastSensitivity { log_cs: f32 },
    ColorVision { correct: u32, total: u32 },
    AmslerGrid { distortions: Vec<AmslerQuestion> },
    Astigmatism {
        clock_hour: Option<u8>,
        axis_degrees: Option<u16>,
    },
    PeripheralVision {
        hits: u32,
        total: u32,
        missed: Vec<Bearing>,
    },
}

impl Summary {
    /// One-line human readable rendering of the score.
    pub fn headline(&self) -> String {
        match self {
            Summary::VisualAcuity {
                snellen_denominator: Some(d),
                ..
            } => format!("20/{d}"),
            Summary::VisualAcuity { .. } => "worse than the largest line".to_string(),
            Summary::ContrastSensitivity { log_cs } => format!("logCS {log_cs:.2}"),
            Summary::ColorVision { correct, total } => format!("{correct}/{total} plates"),
            Summary::AmslerGrid { distortions } if distortions.is_empty() => {
                "no distortions reported".to_string()
            }
            Summary::AmslerGrid { distortions } => {
                format!("{} distortion(s) reported", distortions.len())
            }
            Summary::Astigmatism {
                axis_degrees: Some(axis),
                clock_hour,
            } => match clock_hour {
                Some(h) => format!("darker line at {h} o'clock, axis {axis}°"),
                None => format!("axis {axis}°"),
            },
            Summary::Astigmatism { .. } => "all lines equal".to_string(),
            Summary::PeripheralVision { hits, total, .. } => format!("{hits}/{total} seen"),
        }
    }
}

/// Final outcome handed to the results store once per completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_type: TestType,
    pub eye: Option<Eye>,
    pub summary: Summary,
    pub status: ResultStatus,
    pub trials: usize,
    pub highest_level: u32,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headlines() {
        let acuity = Summary::VisualAcuity {
            snellen_denominator: Some(40),
            logmar: Some(0.3),
        };
        assert_eq!(acuity.headline(), "20/40");
        let astig = Summary::Astigmatism {
            clock_hour: Some(3),
            axis_degrees: Some(90),
        };
        assert_eq!(astig.headline(), "darker line at 3 o'clock, axis 90°");
        let normal = Summary::Astigmatism {
            clock_hour: None,
            axis_degrees: None,
        };
        assert_eq!(normal.headline(), "all lines equal");
    }

    #[test]
    fn result_round_trips_through_json() {
        let result = TestResult {
            test_type: TestType::ColorVision,
            eye: None,
            summary: Summary::ColorVision {
                correct: 7,
                total: 8,
            },
            status: ResultStatus::Normal,
            trials: 8,
            highest_level: 8,
            completed_at: Utc::now(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: TestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
