//! Parsing of typed answers. Anything that does not parse is rejected here
//! and never reaches the engine.

use vscreen_core::{Answer, Bearing, ClockChoice, Direction, Response, Stimulus};

pub fn parse_response(stimulus: &Stimulus, line: &str) -> Result<Response, String> {
    let text = line.trim().to_ascii_lowercase();
    match stimulus {
        Stimulus::TumblingE { .. } => match text.as_str() {
            "u" | "up" => Ok(Response::Direction(Direction::Up)),
            "d" | "down" => Ok(Response::Direction(Direction::Down)),
            "l" | "left" => Ok(Response::Direction(Direction::Left)),
            "r" | "right" => Ok(Response::Direction(Direction::Right)),
            _ => Err("answer with u, d, l or r".to_string()),
        },
        Stimulus::ContrastLetter { .. } => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => {
                    Ok(Response::Letter(c.to_ascii_uppercase()))
                }
                _ => Err("type the single letter you see".to_string()),
            }
        }
        Stimulus::Plate { .. } => {
            if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
                Ok(Response::Digits(text))
            } else {
                Err("type the number you see".to_string())
            }
        }
        Stimulus::AmslerQuestion { .. } => match text.as_str() {
            "y" | "yes" => Ok(Response::Answer(Answer::Yes)),
            "n" | "no" => Ok(Response::Answer(Answer::No)),
            _ => Err("answer y or n".to_string()),
        },
        Stimulus::ClockDial { .. } => match text.as_str() {
            "equal" | "all" | "0" => Ok(Response::Clock(ClockChoice::AllEqual)),
            hour => match hour.parse::<u8>() {
                Ok(h) if (1..=12).contains(&h) => Ok(Response::Clock(ClockChoice::Line(h))),
                _ => Err("type the hour of the darkest line (1-12) or 'equal'".to_string()),
            },
        },
        Stimulus::PeripheralFlash { .. } => match text.as_str() {
            "-" | "none" => Ok(Response::Peripheral(None)),
            other => Bearing::from_abbreviation(other)
                .map(|b| Response::Peripheral(Some(b)))
                .ok_or_else(|| "type where it flashed (n, ne, e, se, s, sw, w, nw) or '-'".to_string()),
        },
    }
}
