use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the front-end loop.
#[derive(Clone, Debug)]
pub enum PacerEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait PacerEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if one arrives before the timeout, or Err(Timeout).
    fn recv_timeout(&self, timeout: Duration) -> Result<PacerEvent, RecvTimeoutError>;
}

/// Production event source reading crossterm events on a worker thread.
pub struct CrosstermEventSource {
    rx: Receiver<PacerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(PacerEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(PacerEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PacerEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PacerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source fed from a plain channel.
pub struct TestEventSource {
    rx: Receiver<PacerEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<PacerEvent>) -> Self {
        Self { rx }
    }
}

impl PacerEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PacerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the front-end one event at a time; quiet periods surface as
/// `Tick` at the pacing cadence. The cadence is purely a display refresh
/// rate: session timing is recomputed from the clock, never counted here.
pub struct Runner<E: PacerEventSource> {
    event_source: E,
    tick_interval: Duration,
}

impl<E: PacerEventSource> Runner<E> {
    pub fn new(event_source: E, tick_interval: Duration) -> Self {
        Self {
            event_source,
            tick_interval,
        }
    }

    /// Blocks up to the tick interval and returns the next event, or Tick
    /// on timeout.
    pub fn step(&self) -> PacerEvent {
        match self.event_source.recv_timeout(self.tick_interval) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                PacerEvent::Tick
            }
        }
    }
}
