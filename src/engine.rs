use chrono::Local;
use log::debug;

use crate::clock::{SessionClock, SystemTimeSource, TimeSource};
use crate::error::PacerError;
use crate::phase::{Phase, PhaseSequence};
use crate::recorder::SessionSummary;
use crate::settings::Settings;
use crate::tracker::{self, PhasePosition};

/// Engine lifecycle: Idle → Running ⇄ Paused → Completed, back to Idle via
/// reset. Idle and Completed do not process ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Events surfaced to the presentation layer, returned by value from
/// `tick()`. Consumer code runs strictly after the engine's own
/// bookkeeping, so a misbehaving consumer cannot corrupt session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged { phase: Phase, duration_secs: f64 },
    SessionCompleted { summary: SessionSummary },
}

/// Everything fixed at session start. Later settings edits never reach a
/// session already underway, paused or not.
#[derive(Debug, Clone)]
struct Snapshot {
    sequence: PhaseSequence,
    total_secs: f64,
    settings: Settings,
    technique: String,
}

/// The session state machine.
///
/// Driven by an external periodic tick; every tick recomputes the phase
/// from the clock's elapsed time instead of counting ticks, so cadence is
/// a display choice, not a correctness requirement. A delayed, dropped or
/// long-suspended tick simply lands on the right phase when it arrives.
#[derive(Debug)]
pub struct SessionEngine<T: TimeSource = SystemTimeSource> {
    clock: SessionClock<T>,
    state: EngineState,
    snapshot: Option<Snapshot>,
    last_observed_phase: Option<usize>,
}

impl SessionEngine<SystemTimeSource> {
    pub fn new() -> Self {
        Self::with_time_source(SystemTimeSource)
    }
}

impl Default for SessionEngine<SystemTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> SessionEngine<T> {
    pub fn with_time_source(time: T) -> Self {
        Self {
            clock: SessionClock::with_time_source(time),
            state: EngineState::Idle,
            snapshot: None,
            last_observed_phase: None,
        }
    }

    /// Start a fresh session from `Idle`, or resume from `Paused`.
    ///
    /// A fresh start snapshots the settings; a resume ignores the arguments
    /// and continues the snapshot taken when the session began. Calling
    /// from `Running` or `Completed` is a no-op.
    pub fn start(&mut self, settings: &Settings, technique: &str) -> Result<(), PacerError> {
        match self.state {
            EngineState::Idle => {
                let sequence = settings.sequence()?;
                let total_secs = settings.total_secs();
                if total_secs <= 0.0 {
                    return Err(PacerError::InvalidConfiguration(
                        "session length must be at least one minute".into(),
                    ));
                }
                self.last_observed_phase = Some(tracker::locate(&sequence, 0.0).phase_index);
                self.snapshot = Some(Snapshot {
                    sequence,
                    total_secs,
                    settings: settings.clone(),
                    technique: technique.to_string(),
                });
                self.clock.reset();
                self.clock.start();
                self.state = EngineState::Running;
                debug!("session started: {total_secs}s of {technique}");
                Ok(())
            }
            EngineState::Paused => {
                self.clock.start();
                self.state = EngineState::Running;
                debug!("session resumed at {:.1}s", self.elapsed_secs());
                Ok(())
            }
            EngineState::Running | EngineState::Completed => Ok(()),
        }
    }

    /// Freeze the session. No-op unless `Running`.
    pub fn pause(&mut self) {
        if self.state == EngineState::Running {
            self.clock.pause();
            self.state = EngineState::Paused;
            debug!("session paused at {:.1}s", self.elapsed_secs());
        }
    }

    /// Discard the session and return to `Idle`. Valid from any state.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.state = EngineState::Idle;
        self.snapshot = None;
        self.last_observed_phase = None;
    }

    /// Advance the state machine one tick.
    ///
    /// Returns at most one event: `SessionCompleted` exactly once when the
    /// total duration is exhausted, or `PhaseChanged` exactly once per
    /// distinct phase transition no matter how many ticks subdivide a
    /// phase. Ticks outside `Running` (including any stale tick arriving
    /// after pause or reset) are ignored.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if self.state != EngineState::Running {
            return None;
        }
        let snapshot = self.snapshot.as_ref()?;

        let elapsed = self.clock.elapsed().as_secs_f64();
        if elapsed >= snapshot.total_secs {
            let summary = SessionSummary {
                total_seconds: snapshot.total_secs.round() as u64,
                inhale_secs: snapshot.settings.inhale_secs,
                hold_high_secs: snapshot.settings.hold_high_secs,
                exhale_secs: snapshot.settings.exhale_secs,
                hold_low_secs: snapshot.settings.hold_low_secs,
                technique: snapshot.technique.clone(),
                completed_at: Local::now(),
            };
            self.clock.pause();
            self.state = EngineState::Completed;
            debug!("session completed after {elapsed:.1}s");
            return Some(SessionEvent::SessionCompleted { summary });
        }

        let position = tracker::locate(&snapshot.sequence, elapsed);
        if self.last_observed_phase != Some(position.phase_index) {
            self.last_observed_phase = Some(position.phase_index);
            return Some(SessionEvent::PhaseChanged {
                phase: position.phase,
                duration_secs: position.duration_secs,
            });
        }
        None
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Snapshot read of the current cycle position, for rendering. Present
    /// while a session is running or paused.
    pub fn position(&self) -> Option<PhasePosition> {
        match self.state {
            EngineState::Running | EngineState::Paused => {
                let snapshot = self.snapshot.as_ref()?;
                Some(tracker::locate(
                    &snapshot.sequence,
                    self.clock.elapsed().as_secs_f64(),
                ))
            }
            EngineState::Idle | EngineState::Completed => None,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    /// Session time left, clamped at zero.
    pub fn remaining_secs(&self) -> f64 {
        match &self.snapshot {
            Some(snapshot) => (snapshot.total_secs - self.elapsed_secs()).max(0.0),
            None => 0.0,
        }
    }

    pub fn technique(&self) -> Option<&str> {
        self.snapshot.as_ref().map(|s| s.technique.as_str())
    }
}
