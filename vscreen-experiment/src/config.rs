//! Declarative per-test configuration.
//!
//! Every test type is described by one [`TestPolicy`] row (quota, pass rule,
//! fail policy, feedback window) plus the stimulus catalogue its levels walk
//! through. The engine reads only these tables; there is no per-test control
//! flow outside stimulus generation and scoring.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vscreen_core::{AmslerQuestion, TestType};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What happens when a level is failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// The session completes immediately.
    Stop,
    /// The session moves on to the next item regardless.
    Continue,
}

/// One row of the termination table consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPolicy {
    pub levels: u32,
    pub trials_per_level: u32,
    pub min_correct: u32,
    pub on_fail: FailPolicy,
    pub start_level: u32,
    pub feedback_ms: u64,
    /// Show correct/incorrect cues; otherwise feedback is a neutral
    /// "recorded" acknowledgement.
    pub graded_feedback: bool,
    /// Pending stimuli older than this are answered with the stimulus'
    /// timeout response.
    pub response_window_ms: Option<u64>,
}

impl TestPolicy {
    pub fn response_window(&self) -> Option<Duration> {
        self.response_window_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualAcuityConfig {
    /// Snellen lines from largest to smallest, as 20/x denominators.
    pub snellen_denominators: Vec<u16>,
    pub trials_per_level: u32,
    pub min_correct: u32,
    pub start_level: u32,
    pub feedback_ms: u64,
    /// Best line at or below this denominator is reported as normal.
    pub normal_max_denominator: u16,
}

impl Default for VisualAcuityConfig {
    fn default() -> Self {
        Self {
            snellen_denominators: vec![200, 100, 70, 50, 40, 30, 25, 20],
            trials_per_level: 3,
            min_correct: 2,
            start_level: 1,
            feedback_ms: 400,
            normal_max_denominator: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContrastSensitivityConfig {
    /// Log contrast sensitivity of each level, ascending difficulty.
    pub log_cs_steps: Vec<f32>,
    pub letters: Vec<char>,
    pub trials_per_level: u32,
    pub min_correct: u32,
    pub feedback_ms: u64,
    pub normal_min_log_cs: f32,
}

impl Default for ContrastSensitivityConfig {
    fn default() -> Self {
        Self {
            log_cs_steps: (0..16).map(|i| i as f32 * 0.15).collect(),
            letters: vec!['C', 'D', 'H', 'K', 'N', 'O', 'R', 'S', 'V', 'Z'],
            trials_per_level: 2,
            min_correct: 1,
            feedback_ms: 400,
            normal_min_log_cs: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorVisionConfig {
    /// Number hidden in each plate, in presentation order.
    pub plates: Vec<String>,
    pub feedback_ms: u64,
    pub graded_feedback: bool,
    pub normal_min_correct: u32,
}

impl Default for ColorVisionConfig {
    fn default() -> Self {
        Self {
            plates: ["12", "8", "29", "5", "3", "15", "74", "6"]
                .into_iter()
                .map(String::from)
                .collect(),
            feedback_ms: 300,
            graded_feedback: false,
            normal_min_correct: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmslerGridConfig {
    pub feedback_ms: u64,
}

impl Default for AmslerGridConfig {
    fn default() -> Self {
        Self { feedback_ms: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AstigmatismConfig {
    pub dial_lines: u8,
}

impl Default for AstigmatismConfig {
    fn default() -> Self {
        Self { dial_lines: 12 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeripheralVisionConfig {
    pub presentations: u32,
    /// Inclusive range the flash eccentricity is drawn from, in degrees.
    pub eccentricity_range_deg: (f32, f32),
    /// 0 disables the timeout.
    pub response_window_ms: u64,
    pub feedback_ms: u64,
    pub normal_min_hits: u32,
}

impl Default for PeripheralVisionConfig {
    fn default() -> Self {
        Self {
            presentations: 12,
            eccentricity_range_deg: (15.0, 35.0),
            response_window_ms: 2000,
            feedback_ms: 500,
            normal_min_hits: 10,
        }
    }
}

/// Engine configuration, one section per test type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub visual_acuity: VisualAcuityConfig,
    pub contrast_sensitivity: ContrastSensitivityConfig,
    pub color_vision: ColorVisionConfig,
    pub amsler_grid: AmslerGridConfig,
    pub astigmatism: AstigmatismConfig,
    pub peripheral_vision: PeripheralVisionConfig,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Derives the termination table row for `test_type`.
    pub fn policy(&self, test_type: TestType) -> TestPolicy {
        match test_type {
            TestType::VisualAcuity => {
                let c = &self.visual_acuity;
                TestPolicy {
                    levels: c.snellen_denominators.len() as u32,
                    trials_per_level: c.trials_per_level,
                    min_correct: c.min_correct,
                    on_fail: FailPolicy::Stop,
                    start_level: c.start_level,
                    feedback_ms: c.feedback_ms,
                    graded_feedback: true,
                    response_window_ms: None,
                }
            }
            TestType::ContrastSensitivity => {
                let c = &self.contrast_sensitivity;
                TestPolicy {
                    levels: c.log_cs_steps.len() as u32,
                    trials_per_level: c.trials_per_level,
                    min_correct: c.min_correct,
                    on_fail: FailPolicy::Stop,
                    start_level: 1,
                    feedback_ms: c.feedback_ms,
                    graded_feedback: true,
                    response_window_ms: None,
                }
            }
            TestType::ColorVision => TestPolicy {
                levels: self.color_vision.plates.len() as u32,
                trials_per_level: 1,
                min_correct: 1,
                on_fail: FailPolicy::Continue,
                start_level: 1,
                feedback_ms: self.color_vision.feedback_ms,
                graded_feedback: self.color_vision.graded_feedback,
                response_window_ms: None,
            },
            TestType::AmslerGrid => TestPolicy {
                levels: AmslerQuestion::ALL.len() as u32,
                trials_per_level: 1,
                min_correct: 1,
                on_fail: FailPolicy::Continue,
                start_level: 1,
                feedback_ms: self.amsler_grid.feedback_ms,
                graded_feedback: false,
                response_window_ms: None,
            },
            TestType::Astigmatism => TestPolicy {
                levels: 1,
                trials_per_level: 1,
                min_correct: 1,
                on_fail: FailPolicy::Continue,
                start_level: 1,
                feedback_ms: 0,
                graded_feedback: false,
                response_window_ms: None,
            },
            TestType::PeripheralVision => {
                let c = &self.peripheral_vision;
                TestPolicy {
                    levels: 1,
                    trials_per_level: c.presentations,
                    min_correct: 0,
                    on_fail: FailPolicy::Continue,
                    start_level: 1,
                    feedback_ms: c.feedback_ms,
                    graded_feedback: true,
                    response_window_ms: (c.response_window_ms > 0).then_some(c.response_window_ms),
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for test_type in TestType::ALL {
            let p = self.policy(test_type);
            if p.levels == 0 {
                return Err(invalid(format!("{test_type}: needs at least one level")));
            }
            if p.trials_per_level == 0 {
                return Err(invalid(format!("{test_type}: trials per level must be > 0")));
            }
            if p.min_correct > p.trials_per_level {
                return Err(invalid(format!(
                    "{test_type}: min_correct {} exceeds trials per level {}",
                    p.min_correct, p.trials_per_level
                )));
            }
            if p.start_level == 0 || p.start_level > p.levels {
                return Err(invalid(format!(
                    "{test_type}: start level {} outside 1..={}",
                    p.start_level, p.levels
                )));
            }
        }

        let acuity = &self.visual_acuity;
        if acuity.snellen_denominators.contains(&0) {
            return Err(invalid("visual_acuity: denominators must be > 0".into()));
        }

        let contrast = &self.contrast_sensitivity;
        if contrast.letters.is_empty() {
            return Err(invalid("contrast_sensitivity: no letters".into()));
        }
        if let Some(c) = contrast.letters.iter().find(|c| !c.is_ascii_alphabetic()) {
            return Err(invalid(format!(
                "contrast_sensitivity: '{c}' is not a letter"
            )));
        }
        if contrast.log_cs_steps.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(invalid(
                "contrast_sensitivity: logCS steps must be finite and >= 0".into(),
            ));
        }

        if let Some(plate) = self
            .color_vision
            .plates
            .iter()
            .find(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(invalid(format!(
                "color_vision: plate answer '{plate}' is not a number"
            )));
        }

        if !(1..=12).contains(&self.astigmatism.dial_lines) {
            return Err(invalid("astigmatism: dial_lines must be 1..=12".into()));
        }

        let (lo, hi) = self.peripheral_vision.eccentricity_range_deg;
        if !(lo.is_finite() && hi.is_finite()) || lo < 0.0 || lo > hi {
            return Err(invalid(format!(
                "peripheral_vision: bad eccentricity range ({lo}, {hi})"
            )));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn default_policy_table() {
        let config = EngineConfig::default();

        let acuity = config.policy(TestType::VisualAcuity);
        assert_eq!(acuity.trials_per_level, 3);
        assert_eq!(acuity.min_correct, 2);
        assert_eq!(acuity.on_fail, FailPolicy::Stop);

        let color = config.policy(TestType::ColorVision);
        assert_eq!(color.levels, 8);
        assert_eq!(color.trials_per_level, 1);
        assert_eq!(color.on_fail, FailPolicy::Continue);

        assert_eq!(config.policy(TestType::AmslerGrid).levels, 4);
        assert_eq!(config.policy(TestType::Astigmatism).levels, 1);

        let peripheral = config.policy(TestType::PeripheralVision);
        assert_eq!(peripheral.levels, 1);
        assert_eq!(peripheral.trials_per_level, 12);
        assert_eq!(peripheral.response_window_ms, Some(2000));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [visual_acuity]
            trials_per_level = 5
            min_correct = 3

            [peripheral_vision]
            presentations = 6
            response_window_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.visual_acuity.trials_per_level, 5);
        assert_eq!(config.visual_acuity.snellen_denominators.len(), 8);
        assert_eq!(config.peripheral_vision.presentations, 6);
        assert_eq!(
            config.policy(TestType::PeripheralVision).response_window_ms,
            None
        );
        assert_eq!(config.color_vision, ColorVisionConfig::default());
    }

    #[test]
    fn rejects_unreachable_pass_rule() {
        let err = EngineConfig::from_toml_str(
            r#"
            [contrast_sensitivity]
            trials_per_level = 2
            min_correct = 3
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_plate_list() {
        let err = EngineConfig::from_toml_str("[color_vision]\nplates = []\n").unwrap_err();
        assert!(err.to_string().contains("color_vision"));
    }

    #[test]
    fn rejects_unknown_section_fields() {
        let err = EngineConfig::from_toml_str("[amsler_grid]\nquestions = 9\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/vscreen.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
