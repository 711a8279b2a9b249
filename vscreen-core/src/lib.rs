pub mod error;
pub mod phase;
pub mod response;
pub mod result;
pub mod stimulus;
pub mod test_type;
pub mod trial;

pub use error::EngineError;
pub use phase::SessionStatus;
pub use response::{Answer, ClockChoice, Response};
pub use result::{ResultStatus, Summary, TestResult};
pub use stimulus::{AmslerQuestion, Bearing, Direction, Stimulus};
pub use test_type::{Eye, TestType};
pub use trial::{Feedback, LevelResult, Trial};
