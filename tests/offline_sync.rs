use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use pacer::error::RemoteError;
use pacer::queue::OfflineQueue;
use pacer::recorder::{RecordOutcome, RemoteStore, SessionRecorder, SessionSummary};

// End-to-end offline behavior: summaries recorded while the backend is
// unreachable survive a reopen of the queue (a new process, in effect) and
// drain once a flush runs against a reachable backend.

#[derive(Clone, Default)]
struct ScriptedRemote {
    online: Arc<AtomicBool>,
}

impl ScriptedRemote {
    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl RemoteStore for ScriptedRemote {
    fn upload(&self, _summary: &SessionSummary) -> Result<(), RemoteError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Status(502))
        }
    }
}

fn summary(technique: &str) -> SessionSummary {
    SessionSummary {
        total_seconds: 600,
        inhale_secs: 4.0,
        hold_high_secs: 4.0,
        exhale_secs: 4.0,
        hold_low_secs: 4.0,
        technique: technique.to_string(),
        completed_at: Local::now(),
    }
}

#[test]
fn queued_sessions_survive_reopen_and_flush_once_remote_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("queue.db");
    let remote = ScriptedRemote::default();

    // First "run": backend down, two sessions finish.
    {
        let recorder = SessionRecorder::new(
            Box::new(remote.clone()),
            OfflineQueue::open(&db_path).unwrap(),
        );
        assert_eq!(
            recorder.record(&summary("Breathing 1")).unwrap(),
            RecordOutcome::QueuedLocally
        );
        assert_eq!(
            recorder.record(&summary("Breathing 2 (Oscilloscope)")).unwrap(),
            RecordOutcome::QueuedLocally
        );
        assert_eq!(recorder.queued().unwrap(), 2);
    }

    // Second "run": backend still down, nothing is lost by a failed flush.
    {
        let recorder = SessionRecorder::new(
            Box::new(remote.clone()),
            OfflineQueue::open(&db_path).unwrap(),
        );
        let report = recorder.flush_queued().unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(report.remaining, 2);
    }

    // Third "run": backend is back, the queue drains completely.
    remote.set_online(true);
    {
        let recorder = SessionRecorder::new(
            Box::new(remote.clone()),
            OfflineQueue::open(&db_path).unwrap(),
        );
        let report = recorder.flush_queued().unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.remaining, 0);
        assert_eq!(recorder.queued().unwrap(), 0);
    }
}

#[test]
fn record_uploads_directly_when_remote_is_reachable() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("queue.db");
    let remote = ScriptedRemote::default();
    remote.set_online(true);

    let recorder =
        SessionRecorder::new(Box::new(remote), OfflineQueue::open(&db_path).unwrap());
    assert_eq!(
        recorder.record(&summary("Breathing 1")).unwrap(),
        RecordOutcome::Persisted
    );
    assert_eq!(recorder.queued().unwrap(), 0);
}
