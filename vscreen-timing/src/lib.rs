pub mod timer;

pub use timer::{ManualTimer, SystemTimer, Timer};
