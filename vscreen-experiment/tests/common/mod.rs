#![allow(dead_code)]

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use vscreen_core::{
    Answer, Bearing, ClockChoice, Direction, Eye, Response, Stimulus, TestType,
};
use vscreen_experiment::{EngineConfig, ResponseOutcome, TestSession};
use vscreen_timing::ManualTimer;

pub type Session = TestSession<ManualTimer, StdRng>;

pub fn session(test_type: TestType, eye: Option<Eye>) -> (Session, ManualTimer) {
    session_with(test_type, eye, EngineConfig::default())
}

pub fn session_with(
    test_type: TestType,
    eye: Option<Eye>,
    config: EngineConfig,
) -> (Session, ManualTimer) {
    let timer = ManualTimer::new();
    let session = TestSession::begin(
        test_type,
        eye,
        config,
        timer.clone(),
        StdRng::seed_from_u64(7),
    )
    .unwrap();
    (session, timer)
}

/// A response of the right kind that does not match `stimulus`.
pub fn wrong_response(stimulus: &Stimulus) -> Response {
    match stimulus {
        Stimulus::TumblingE { direction, .. } => Response::Direction(match direction {
            Direction::Up => Direction::Down,
            _ => Direction::Up,
        }),
        Stimulus::ContrastLetter { letter, .. } => {
            Response::Letter(if *letter == 'Z' { 'C' } else { 'Z' })
        }
        Stimulus::Plate { digits, .. } => {
            Response::Digits(if digits == "99" { "98" } else { "99" }.to_string())
        }
        Stimulus::AmslerQuestion { .. } => Response::Answer(Answer::Yes),
        Stimulus::ClockDial { .. } => Response::Clock(ClockChoice::Line(3)),
        Stimulus::PeripheralFlash { bearing, .. } => Response::Peripheral(Some(
            if *bearing == Bearing::North {
                Bearing::South
            } else {
                Bearing::North
            },
        )),
    }
}

/// Waits out any feedback window, then answers the pending stimulus.
pub fn answer(session: &mut Session, timer: &ManualTimer, correct: bool) -> ResponseOutcome {
    timer.advance(Duration::from_secs(1));
    let stimulus = session.present_trial().unwrap().clone();
    let response = if correct {
        stimulus.expected_response()
    } else {
        wrong_response(&stimulus)
    };
    session.record_response(response).unwrap()
}
