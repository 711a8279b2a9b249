use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic clock the engine measures its feedback and response windows on.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
}

/// Nanoseconds since construction, backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemTimer {
    pub start: Instant,
}

impl Timer for SystemTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d)
    }
}

impl SystemTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand-advanced clock. Clones share the same time, so a host or test can
/// keep one handle and move time forward under a running session.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns
            .fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, ns: u64) {
        self.now_ns.store(ns, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    /// Sleeping a manual clock just advances it.
    fn sleep(&self, d: Duration) {
        self.advance(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clones_share_time() {
        let timer = ManualTimer::new();
        let handle = timer.clone();
        handle.advance(Duration::from_millis(250));
        assert_eq!(timer.now(), 250_000_000);
        assert_eq!(timer.elapsed(50_000_000), Duration::from_millis(200));
    }

    #[test]
    fn manual_sleep_advances() {
        let timer = ManualTimer::new();
        timer.sleep(Duration::from_millis(5));
        assert_eq!(timer.now(), 5_000_000);
    }

    #[test]
    fn elapsed_never_underflows() {
        let timer = ManualTimer::new();
        assert_eq!(timer.elapsed(1_000), Duration::ZERO);
    }

    #[test]
    fn system_timer_is_monotonic() {
        let timer = SystemTimer::new();
        let a = timer.now();
        let b = timer.now();
        assert!(b >= a);
    }
}
