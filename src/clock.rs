use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of the current instant. Seam for deterministic tests.
pub trait TimeSource {
    fn now(&self) -> Instant;
}

/// Production time source backed by the monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced time source for tests.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    epoch: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.epoch + *self.offset.lock().unwrap()
    }
}

/// Wall-clock-anchored elapsed-time tracker with pause/resume.
///
/// `elapsed()` excludes all paused intervals, so the position within the
/// breathing cycle is preserved exactly across a pause of any length.
/// Pausing shifts the wall-clock end of a session; it never shifts the
/// perceived position inside it.
#[derive(Debug)]
pub struct SessionClock<T: TimeSource = SystemTimeSource> {
    time: T,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl SessionClock<SystemTimeSource> {
    pub fn new() -> Self {
        Self::with_time_source(SystemTimeSource)
    }
}

impl Default for SessionClock<SystemTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> SessionClock<T> {
    pub fn with_time_source(time: T) -> Self {
        Self {
            time,
            started_at: None,
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    /// Start the clock, or resume it after a pause. No-op while running.
    pub fn start(&mut self) {
        let now = self.time.now();
        match (self.started_at, self.paused_at.take()) {
            (None, _) => {
                self.started_at = Some(now);
                self.paused_total = Duration::ZERO;
            }
            (Some(_), Some(paused_at)) => {
                self.paused_total += now.saturating_duration_since(paused_at);
            }
            (Some(_), None) => {}
        }
    }

    /// Freeze elapsed time. No-op unless running.
    pub fn pause(&mut self) {
        if self.started_at.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(self.time.now());
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.paused_at.is_none()
    }

    /// Elapsed time excluding pauses. Zero before the first start; frozen
    /// at the instant of the last pause while paused.
    pub fn elapsed(&self) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let reference = self.paused_at.unwrap_or_else(|| self.time.now());
        reference
            .saturating_duration_since(started_at)
            .saturating_sub(self.paused_total)
    }

    /// Return to the unstarted state.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }
}
