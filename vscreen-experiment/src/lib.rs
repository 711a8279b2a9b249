pub mod config;
pub mod scoring;
pub mod state;
pub mod store;
pub mod trial;
pub use config::{ConfigError, EngineConfig, FailPolicy, TestPolicy};
pub use state::{ResponseOutcome, SessionEvent, SessionUpdate, TestSession, Transition};
pub use store::{MemoryStore, ResultStore, StoreError, StoredResult};
pub use trial::{ActiveTrial, PendingFeedback};
