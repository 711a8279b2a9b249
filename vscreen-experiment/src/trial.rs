use vscreen_core::Stimulus;

/// The stimulus currently on screen, waiting for a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTrial {
    pub id: usize,
    pub level: u32,
    pub stimulus: Stimulus,
    pub presented_at: u64,
}

/// Feedback window opened after a response; input is dropped until
/// `until_ns` passes on the session timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingFeedback {
    pub feedback: vscreen_core::Feedback,
    pub until_ns: u64,
}
