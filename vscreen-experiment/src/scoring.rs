//! Reduction of a completed session's trial log to its summary metric.

use vscreen_core::{
    Answer, Bearing, ClockChoice, LevelResult, Response, ResultStatus, Stimulus, Summary,
    TestType, Trial,
};

use crate::config::EngineConfig;

/// Astigmatism axis in degrees for a darker line at `hour` o'clock
/// (rule of 30: the lower clock number of the line times 30).
pub fn astigmatism_axis(hour: u8) -> u16 {
    ((u16::from(hour) + 11) % 6 + 1) * 30
}

/// Highest level whose quota was met with a pass.
pub fn best_passed_level(levels: &[LevelResult]) -> Option<u32> {
    levels.iter().filter(|l| l.passed).map(|l| l.level).max()
}

/// Entry of a 1-based level table.
fn level_entry<V: Copy>(table: &[V], level: u32) -> Option<V> {
    let index = level.checked_sub(1)?;
    table.get(index as usize).copied()
}

pub fn summarize(
    test_type: TestType,
    config: &EngineConfig,
    trials: &[Trial],
    levels: &[LevelResult],
) -> (Summary, ResultStatus) {
    match test_type {
        TestType::VisualAcuity => {
            let c = &config.visual_acuity;
            // A miss on a later start line scores the unshown line above it.
            let denominator = best_passed_level(levels)
                .or_else(|| c.start_level.checked_sub(1))
                .and_then(|level| level_entry(&c.snellen_denominators, level));
            let status = match denominator {
                Some(d) if d <= c.normal_max_denominator => ResultStatus::Normal,
                _ => ResultStatus::Concerns,
            };
            let summary = Summary::VisualAcuity {
                snellen_denominator: denominator,
                logmar: denominator.map(|d| (f32::from(d) / 20.0).log10()),
            };
            (summary, status)
        }
        TestType::ContrastSensitivity => {
            let c = &config.contrast_sensitivity;
            let log_cs = best_passed_level(levels)
                .and_then(|level| level_entry(&c.log_cs_steps, level))
                .unwrap_or(0.0);
            let status = if log_cs >= c.normal_min_log_cs {
                ResultStatus::Normal
            } else {
                ResultStatus::Concerns
            };
            (Summary::ContrastSensitivity { log_cs }, status)
        }
        TestType::ColorVision => {
            let correct = trials.iter().filter(|t| t.correct).count() as u32;
            let status = if correct >= config.color_vision.normal_min_correct {
                ResultStatus::Normal
            } else {
                ResultStatus::Concerns
            };
            let summary = Summary::ColorVision {
                correct,
                total: trials.len() as u32,
            };
            (summary, status)
        }
        TestType::AmslerGrid => {
            let distortions: Vec<_> = trials
                .iter()
                .filter(|t| t.actual == Response::Answer(Answer::Yes))
                .filter_map(|t| match t.stimulus {
                    Stimulus::AmslerQuestion { question } => Some(question),
                    _ => None,
                })
                .collect();
            let status = if distortions.is_empty() {
                ResultStatus::Normal
            } else {
                ResultStatus::Concerns
            };
            (Summary::AmslerGrid { distortions }, status)
        }
        TestType::Astigmatism => {
            let clock_hour = trials.last().and_then(|t| match t.actual {
                Response::Clock(ClockChoice::Line(hour)) => Some(hour),
                _ => None,
            });
            let status = if clock_hour.is_some() {
                ResultStatus::Concerns
            } else {
                ResultStatus::Normal
            };
            let summary = Summary::Astigmatism {
                clock_hour,
                axis_degrees: clock_hour.map(astigmatism_axis),
            };
            (summary, status)
        }
        TestType::PeripheralVision => {
            let hits = trials.iter().filter(|t| t.correct).count() as u32;
            let missed_at: Vec<Bearing> = trials
                .iter()
                .filter(|t| !t.correct)
                .filter_map(|t| match t.stimulus {
                    Stimulus::PeripheralFlash { bearing, .. } => Some(bearing),
                    _ => None,
                })
                .collect();
            let missed = Bearing::ALL
                .into_iter()
                .filter(|b| missed_at.contains(b))
                .collect();
            let status = if hits >= config.peripheral_vision.normal_min_hits {
                ResultStatus::Normal
            } else {
                ResultStatus::Concerns
            };
            let summary = Summary::PeripheralVision {
                hits,
                total: trials.len() as u32,
                missed,
            };
            (summary, status)
        }
    }
}
