use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The six screening tests driven by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    VisualAcuity,
    ContrastSensitivity,
    ColorVision,
    AmslerGrid,
    Astigmatism,
    PeripheralVision,
}

impl TestType {
    pub const ALL: [TestType; 6] = [
        TestType::VisualAcuity,
        TestType::ContrastSensitivity,
        TestType::ColorVision,
        TestType::AmslerGrid,
        TestType::Astigmatism,
        TestType::PeripheralVision,
    ];

    /// Tests screened one eye at a time, with an eye-selection step before
    /// the instructions.
    pub fn is_two_eye(&self) -> bool {
        matches!(self, TestType::Astigmatism | TestType::PeripheralVision)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            TestType::VisualAcuity => "visual_acuity",
            TestType::ContrastSensitivity => "contrast_sensitivity",
            TestType::ColorVision => "color_vision",
            TestType::AmslerGrid => "amsler_grid",
            TestType::Astigmatism => "astigmatism",
            TestType::PeripheralVision => "peripheral_vision",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TestType::VisualAcuity => "Visual Acuity",
            TestType::ContrastSensitivity => "Contrast Sensitivity",
            TestType::ColorVision => "Color Vision",
            TestType::AmslerGrid => "Amsler Grid",
            TestType::Astigmatism => "Astigmatism",
            TestType::PeripheralVision => "Peripheral Vision",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "visual_acuity" | "acuity" => Ok(TestType::VisualAcuity),
            "contrast_sensitivity" | "contrast" => Ok(TestType::ContrastSensitivity),
            "color_vision" | "color" => Ok(TestType::ColorVision),
            "amsler_grid" | "amsler" => Ok(TestType::AmslerGrid),
            "astigmatism" => Ok(TestType::Astigmatism),
            "peripheral_vision" | "peripheral" => Ok(TestType::PeripheralVision),
            _ => Err(format!("unknown test type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn other(&self) -> Eye {
        match self {
            Eye::Left => Eye::Right,
            Eye::Right => Eye::Left,
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Eye::Left => "left",
            Eye::Right => "right",
        })
    }
}

impl FromStr for Eye {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Eye::Left),
            "right" | "r" => Ok(Eye::Right),
            _ => Err(format!("unknown eye: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_astigmatism_and_peripheral_are_two_eye() {
        let two_eye: Vec<_> = TestType::ALL.iter().filter(|t| t.is_two_eye()).collect();
        assert_eq!(
            two_eye,
            vec![&TestType::Astigmatism, &TestType::PeripheralVision]
        );
    }

    #[test]
    fn parses_slugs_and_short_names() {
        for t in TestType::ALL {
            assert_eq!(t.slug().parse::<TestType>().unwrap(), t);
        }
        assert_eq!("acuity".parse::<TestType>().unwrap(), TestType::VisualAcuity);
        assert_eq!("Amsler-Grid".parse::<TestType>().unwrap(), TestType::AmslerGrid);
        assert!("hearing".parse::<TestType>().is_err());
    }

    #[test]
    fn eye_other_flips() {
        assert_eq!(Eye::Left.other(), Eye::Right);
        assert_eq!("R".parse::<Eye>().unwrap(), Eye::Right);
    }
}
