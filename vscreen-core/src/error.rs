//! Engine error types.
//!
//! The first three variants are input guards: the engine drops the input
//! and leaves the session untouched. Hosts treat them as silent no-ops
//! rather than user-visible failures (see [`EngineError::is_silent`]).

use thiserror::Error;

use crate::phase::SessionStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed or out-of-range response, or one that does not fit the
    /// current stimulus.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Response delivered to a session that is already complete or exited.
    #[error("session is {status}, input ignored")]
    StaleSession { status: SessionStatus },

    /// Response arriving while the feedback window is open.
    #[error("feedback window open, input ignored")]
    Debounced,

    /// Lifecycle operation called from a status that does not allow it.
    #[error("cannot {operation} while session is {status}")]
    WrongStatus {
        operation: &'static str,
        status: SessionStatus,
    },

    #[error("test does not screen eyes separately")]
    NotTwoEye,

    #[error("no stimulus is being presented")]
    NoActiveTrial,

    #[error("result already finalized for this session")]
    AlreadyFinalized,

    /// Engine configuration rejected before a session was started.
    #[error("{0}")]
    InvalidConfig(String),

    /// The results store refused the finalized result.
    #[error("result store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Returns `true` for the input guards that are dropped without surfacing
    /// anything to the user.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidResponse(_)
                | EngineError::StaleSession { .. }
                | EngineError::Debounced
        )
    }
}
