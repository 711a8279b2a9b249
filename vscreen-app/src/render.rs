//! Terminal rendering of stimuli, instructions and results.

use vscreen_core::{
    Bearing, Direction, Feedback, ResultStatus, Stimulus, TestResult, TestType,
};

const E_SIZE: usize = 5;

/// Tumbling E as block art. The unrotated glyph points right.
pub fn tumbling_e(direction: Direction) -> String {
    let base = |r: usize, c: usize| c == 0 || r % 2 == 0;
    let last = E_SIZE - 1;
    let mut out = String::new();
    for r in 0..E_SIZE {
        for c in 0..E_SIZE {
            let filled = match direction {
                Direction::Right => base(r, c),
                Direction::Left => base(r, last - c),
                Direction::Down => base(c, r),
                Direction::Up => base(c, last - r),
            };
            out.push_str(if filled { "██" } else { "  " });
        }
        out.push('\n');
    }
    out
}

/// Letter in a gray shade matching its contrast against a white background.
pub fn contrast_letter(letter: char, contrast: f32) -> String {
    let shade = (255.0 * (1.0 - contrast.clamp(0.0, 1.0))).round() as u8;
    format!("\x1b[48;2;255;255;255m\x1b[38;2;{shade};{shade};{shade}m   {letter}   \x1b[0m")
}

/// Fixation cross with a flash at `bearing`.
pub fn peripheral_field(bearing: Bearing) -> String {
    const SIZE: usize = 9;
    let mid = SIZE / 2;
    let (row, col) = match bearing {
        Bearing::North => (0, mid),
        Bearing::NorthEast => (0, SIZE - 1),
        Bearing::East => (mid, SIZE - 1),
        Bearing::SouthEast => (SIZE - 1, SIZE - 1),
        Bearing::South => (SIZE - 1, mid),
        Bearing::SouthWest => (SIZE - 1, 0),
        Bearing::West => (mid, 0),
        Bearing::NorthWest => (0, 0),
    };
    let mut out = String::new();
    for r in 0..SIZE {
        for c in 0..SIZE {
            out.push(if (r, c) == (row, col) {
                '*'
            } else if (r, c) == (mid, mid) {
                '+'
            } else {
                '.'
            });
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

fn amsler_grid() -> String {
    let mut out = String::new();
    for r in 0..7 {
        for c in 0..7 {
            out.push_str(if (r, c) == (3, 3) { "-●-" } else { "-+-" });
        }
        out.push('\n');
    }
    out
}

pub fn stimulus(stimulus: &Stimulus, level: u32, levels: u32) -> String {
    match stimulus {
        Stimulus::TumblingE {
            direction,
            snellen_denominator,
            ..
        } => format!(
            "Line {level}/{levels} (20/{snellen_denominator})\n{}Which way do the bars point? [u/d/l/r]",
            tumbling_e(*direction)
        ),
        Stimulus::ContrastLetter {
            letter, contrast, ..
        } => format!(
            "Step {level}/{levels}\n{}\nWhich letter is this?",
            contrast_letter(*letter, *contrast)
        ),
        Stimulus::Plate { number, .. } => {
            format!("Plate {number} of {levels}. Type the number hidden in the plate.")
        }
        Stimulus::AmslerQuestion { question } => format!(
            "{}Look at the center dot. Question {level} of {levels}:\n{} [y/n]",
            amsler_grid(),
            question.prompt()
        ),
        Stimulus::ClockDial { lines } => format!(
            "Look at the clock dial with {lines} line groups.\nType the hour of the darkest line, or 'equal' if all look the same."
        ),
        Stimulus::PeripheralFlash { bearing, .. } => format!(
            "{}Keep looking at '+'. Where did the flash appear? [n/ne/e/se/s/sw/w/nw, '-' if not seen]",
            peripheral_field(*bearing)
        ),
    }
}

pub fn instructions(test_type: TestType) -> &'static str {
    match test_type {
        TestType::VisualAcuity => {
            "Sit at arm's length. Report which way the E's bars point. Each line has three Es; read two to move to a smaller line."
        }
        TestType::ContrastSensitivity => {
            "Letters get fainter at every step. Type each letter you can make out."
        }
        TestType::ColorVision => "Eight plates will be shown. Type the number you see in each.",
        TestType::AmslerGrid => {
            "Cover one eye and keep looking at the center dot while answering four questions."
        }
        TestType::Astigmatism => {
            "Cover the other eye. Say whether any line on the clock dial looks darker than the rest."
        }
        TestType::PeripheralVision => {
            "Cover the other eye and keep looking at the center cross. Report where each flash appears."
        }
    }
}

pub const TOO_SLOW: &str = "Too slow, counted as not seen.";

pub fn feedback(feedback: Feedback) -> &'static str {
    match feedback {
        Feedback::Correct => "✓",
        Feedback::Incorrect => "✗",
        Feedback::Recorded => "·",
    }
}

pub fn result(result: &TestResult) -> String {
    let status = match result.status {
        ResultStatus::Normal => "Normal",
        ResultStatus::Concerns => "Concerns, consider seeing an eye care professional",
    };
    let eye = result
        .eye
        .map(|e| format!(" ({e} eye)"))
        .unwrap_or_default();
    format!(
        "{}{eye}: {}. {status}.",
        result.test_type.title(),
        result.summary.headline()
    )
}
