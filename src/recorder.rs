use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;
use std::time::Duration;

use crate::error::RemoteError;
use crate::queue::OfflineQueue;

/// Immutable record of a finished session, handed to the recorder once at
/// completion.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub total_seconds: u64,
    pub inhale_secs: f64,
    pub hold_high_secs: f64,
    pub exhale_secs: f64,
    pub hold_low_secs: f64,
    pub technique: String,
    pub completed_at: DateTime<Local>,
}

/// Result of handing a summary to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Persisted,
    QueuedLocally,
}

/// Remote persistence boundary. Production talks to the sessions API;
/// tests substitute a scripted double.
pub trait RemoteStore {
    fn upload(&self, summary: &SessionSummary) -> Result<(), RemoteError>;
}

/// Wire payload for `POST /api/sessions/`. Field names match the backend
/// serializer; durations are whole seconds there.
#[derive(Debug, Serialize)]
struct SessionPayload<'a> {
    duration_seconds: u64,
    inhale_seconds: u64,
    hold_seconds: u64,
    exhale_seconds: u64,
    exhale_hold_seconds: u64,
    technique: &'a str,
    device: &'static str,
}

impl<'a> From<&'a SessionSummary> for SessionPayload<'a> {
    fn from(summary: &'a SessionSummary) -> Self {
        Self {
            duration_seconds: summary.total_seconds,
            inhale_seconds: summary.inhale_secs.round() as u64,
            hold_seconds: summary.hold_high_secs.round() as u64,
            exhale_seconds: summary.exhale_secs.round() as u64,
            exhale_hold_seconds: summary.hold_low_secs.round() as u64,
            technique: &summary.technique,
            device: "terminal",
        }
    }
}

/// Sessions API client.
#[derive(Debug)]
pub struct HttpRemoteStore {
    client: reqwest::blocking::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            auth_token,
        })
    }
}

impl RemoteStore for HttpRemoteStore {
    fn upload(&self, summary: &SessionSummary) -> Result<(), RemoteError> {
        let url = format!("{}/api/sessions/", self.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&SessionPayload::from(summary));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status(status.as_u16()))
        }
    }
}

/// Remote used for `--offline` runs: every summary goes straight to the
/// local queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

impl RemoteStore for OfflineRemote {
    fn upload(&self, _summary: &SessionSummary) -> Result<(), RemoteError> {
        Err(RemoteError::Offline)
    }
}

/// Delivery report from a queue flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub remaining: usize,
}

/// Hands finished sessions to the backend, falling back to the durable
/// local queue on any remote failure. A completed session is never dropped:
/// either the backend has it or the queue does.
pub struct SessionRecorder {
    remote: Box<dyn RemoteStore + Send>,
    queue: OfflineQueue,
}

impl SessionRecorder {
    pub fn new(remote: Box<dyn RemoteStore + Send>, queue: OfflineQueue) -> Self {
        Self { remote, queue }
    }

    /// Record a finished session: remote first, durable queue on failure.
    ///
    /// Errors only when even the local queue cannot be written; remote
    /// failures are absorbed and reported as `QueuedLocally`.
    pub fn record(&self, summary: &SessionSummary) -> rusqlite::Result<RecordOutcome> {
        match self.remote.upload(summary) {
            Ok(()) => {
                info!("session uploaded ({})", summary.technique);
                Ok(RecordOutcome::Persisted)
            }
            Err(err) => {
                warn!("upload failed, queuing locally: {err}");
                self.queue.enqueue(summary)?;
                Ok(RecordOutcome::QueuedLocally)
            }
        }
    }

    /// Attempt delivery of everything queued. Delivered entries are
    /// removed; failures stay queued for the next flush.
    pub fn flush_queued(&self) -> rusqlite::Result<FlushReport> {
        let mut delivered = 0;
        let mut remaining = 0;
        for (id, summary) in self.queue.pending()? {
            match self.remote.upload(&summary) {
                Ok(()) => {
                    self.queue.remove(id)?;
                    delivered += 1;
                }
                Err(err) => {
                    warn!("flush: queued session {id} still undeliverable: {err}");
                    remaining += 1;
                }
            }
        }
        if delivered > 0 {
            info!("flushed {delivered} queued session(s)");
        }
        Ok(FlushReport {
            delivered,
            remaining,
        })
    }

    pub fn queued(&self) -> rusqlite::Result<usize> {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted remote: flips between reachable and unreachable.
    #[derive(Clone, Default)]
    pub(crate) struct FakeRemote {
        online: Arc<AtomicBool>,
        uploads: Arc<AtomicUsize>,
    }

    impl FakeRemote {
        pub(crate) fn online() -> Self {
            let remote = Self::default();
            remote.set_online(true);
            remote
        }

        pub(crate) fn offline() -> Self {
            Self::default()
        }

        pub(crate) fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }

        pub(crate) fn upload_count(&self) -> usize {
            self.uploads.load(Ordering::SeqCst)
        }
    }

    impl RemoteStore for FakeRemote {
        fn upload(&self, _summary: &SessionSummary) -> Result<(), RemoteError> {
            if self.online.load(Ordering::SeqCst) {
                self.uploads.fetch_add(1, Ordering::SeqCst);
                Ok(())
            } else {
                Err(RemoteError::Status(503))
            }
        }
    }

    pub(crate) fn summary() -> SessionSummary {
        SessionSummary {
            total_seconds: 600,
            inhale_secs: 4.0,
            hold_high_secs: 4.0,
            exhale_secs: 4.0,
            hold_low_secs: 4.0,
            technique: "Breathing 1".to_string(),
            completed_at: Local::now(),
        }
    }

    #[test]
    fn record_persists_when_remote_succeeds() {
        let remote = FakeRemote::online();
        let recorder =
            SessionRecorder::new(Box::new(remote.clone()), OfflineQueue::open_in_memory().unwrap());

        let outcome = recorder.record(&summary()).unwrap();
        assert_eq!(outcome, RecordOutcome::Persisted);
        assert_eq!(remote.upload_count(), 1);
        assert_eq!(recorder.queued().unwrap(), 0);
    }

    #[test]
    fn record_queues_locally_when_remote_fails() {
        let recorder = SessionRecorder::new(
            Box::new(FakeRemote::offline()),
            OfflineQueue::open_in_memory().unwrap(),
        );

        let outcome = recorder.record(&summary()).unwrap();
        assert_eq!(outcome, RecordOutcome::QueuedLocally);
        assert_eq!(recorder.queued().unwrap(), 1);
    }

    #[test]
    fn flush_delivers_queue_once_remote_recovers() {
        let remote = FakeRemote::offline();
        let recorder = SessionRecorder::new(
            Box::new(remote.clone()),
            OfflineQueue::open_in_memory().unwrap(),
        );

        recorder.record(&summary()).unwrap();
        recorder.record(&summary()).unwrap();
        assert_eq!(recorder.queued().unwrap(), 2);

        // Still down: nothing delivered, nothing lost.
        let report = recorder.flush_queued().unwrap();
        assert_eq!(report, FlushReport { delivered: 0, remaining: 2 });

        remote.set_online(true);
        let report = recorder.flush_queued().unwrap();
        assert_eq!(report, FlushReport { delivered: 2, remaining: 0 });
        assert_eq!(recorder.queued().unwrap(), 0);
    }

    #[test]
    fn offline_remote_always_queues() {
        let recorder = SessionRecorder::new(
            Box::new(OfflineRemote),
            OfflineQueue::open_in_memory().unwrap(),
        );
        let outcome = recorder.record(&summary()).unwrap();
        assert_eq!(outcome, RecordOutcome::QueuedLocally);
    }

    #[test]
    fn payload_uses_backend_field_names() {
        let summary = summary();
        let payload = SessionPayload::from(&summary);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["duration_seconds"], 600);
        assert_eq!(json["inhale_seconds"], 4);
        assert_eq!(json["hold_seconds"], 4);
        assert_eq!(json["exhale_seconds"], 4);
        assert_eq!(json["exhale_hold_seconds"], 4);
        assert_eq!(json["technique"], "Breathing 1");
        assert_eq!(json["device"], "terminal");
    }
}
