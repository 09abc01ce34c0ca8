use std::{sync::Arc, time::Instant};

use anyhow::Result;
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::{
    db::Database,
    error::ValidationError,
    models::{top_sample, Sample, SessionSummary},
};

use super::{IngestOutcome, Threshold, TrackerState};

/// Point-in-time view of the tracker for presenters, safe in any state.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub state: TrackerState,
    pub elapsed_secs: f64,
}

/// Owns the accumulation state machine and wires it to persistence.
///
/// Commands arrive from whatever interface drives the session (a feed
/// replay, a UI, a test); invalid-state commands are absorbed as no-ops
/// since frame delivery cannot be synchronized with lifecycle buttons.
/// Every mutation broadcasts a fresh snapshot on a watch channel.
pub struct TrackerController {
    state: Arc<Mutex<TrackerState>>,
    db: Database,
    threshold: Threshold,
    epoch: Instant,
    snapshot_tx: watch::Sender<TrackerSnapshot>,
}

impl TrackerController {
    pub fn new(db: Database, threshold: Threshold) -> Self {
        let (snapshot_tx, _) = watch::channel(TrackerSnapshot {
            state: TrackerState::new(),
            elapsed_secs: 0.0,
        });

        Self {
            state: Arc::new(Mutex::new(TrackerState::new())),
            db,
            threshold,
            epoch: Instant::now(),
            snapshot_tx,
        }
    }

    /// Milliseconds on the controller's monotonic clock, for live callers
    /// that do not carry their own frame timestamps.
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Watch the snapshot stream; receives an update after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub async fn start(&self, labels: &[String], at_ms: u64) -> TrackerSnapshot {
        let session_id = Uuid::new_v4().to_string();
        let mut state = self.state.lock().await;
        match state.begin_session(session_id.clone(), labels, at_ms) {
            Ok(()) => info!(
                "session {session_id} started with {} registered classes",
                labels.len()
            ),
            Err(err) => debug!("start ignored: {err}"),
        }
        self.publish(&state, at_ms)
    }

    pub async fn pause(&self, at_ms: u64) -> TrackerSnapshot {
        let mut state = self.state.lock().await;
        if let Err(err) = state.pause(at_ms) {
            debug!("pause ignored: {err}");
        }
        self.publish(&state, at_ms)
    }

    pub async fn resume(&self, at_ms: u64) -> TrackerSnapshot {
        let mut state = self.state.lock().await;
        if let Err(err) = state.resume(at_ms) {
            debug!("resume ignored: {err}");
        }
        self.publish(&state, at_ms)
    }

    /// Ingest one frame's full score list; the dominant score is selected
    /// here so samples reach the state machine already top-1.
    pub async fn ingest(
        &self,
        scores: &[Sample],
        frame_ms: u64,
    ) -> Result<IngestOutcome, ValidationError> {
        let top = top_sample(scores).ok_or(ValidationError::EmptyFrame)?;
        let mut state = self.state.lock().await;
        let outcome = state.ingest(top, frame_ms, self.threshold)?;
        self.publish(&state, frame_ms);
        Ok(outcome)
    }

    /// Finalize the session, persist its summary to history, and report it.
    /// Returns `None` when there is no session to end.
    pub async fn end(&self, at_ms: u64) -> Result<Option<SessionSummary>> {
        let summary = {
            let mut state = self.state.lock().await;
            match state.finalize(at_ms) {
                Ok(summary) => {
                    self.publish(&state, at_ms);
                    summary
                }
                Err(err) => {
                    debug!("end ignored: {err}");
                    return Ok(None);
                }
            }
        };

        self.db.insert_summary(&summary, Utc::now()).await?;
        info!(
            "session {} saved: {:.2}s elapsed, {} poses detected",
            summary.session_id, summary.total_secs, summary.poses_detected
        );
        Ok(Some(summary))
    }

    pub async fn reset(&self) -> TrackerSnapshot {
        let mut state = self.state.lock().await;
        state.reset();
        self.publish(&state, 0)
    }

    pub async fn snapshot(&self, at_ms: u64) -> TrackerSnapshot {
        let state = self.state.lock().await;
        TrackerSnapshot {
            elapsed_secs: state.elapsed_secs(at_ms),
            state: state.clone(),
        }
    }

    fn publish(&self, state: &TrackerState, at_ms: u64) -> TrackerSnapshot {
        let snapshot = TrackerSnapshot {
            elapsed_secs: state.elapsed_secs(at_ms),
            state: state.clone(),
        };
        let _ = self.snapshot_tx.send(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackerStatus;
    use std::path::PathBuf;

    fn memory_controller() -> TrackerController {
        let db = Database::new(PathBuf::from(":memory:")).unwrap();
        TrackerController::new(db, Threshold::from_percent(80.0))
    }

    fn frame(label: &str, confidence: f64) -> Vec<Sample> {
        vec![Sample::new(label, confidence)]
    }

    #[tokio::test]
    async fn full_session_persists_a_summary_to_history() {
        let controller = memory_controller();

        controller.start(&["tree".into(), "warrior".into()], 0).await;
        controller.ingest(&frame("tree", 0.9), 0).await.unwrap();
        controller.ingest(&frame("tree", 0.9), 500).await.unwrap();
        let summary = controller.end(1000).await.unwrap().unwrap();

        assert_eq!(summary.poses_detected, 1);
        assert_eq!(summary.total_secs, 1.0);

        let history = controller.db.list_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].summary.session_id, summary.session_id);
    }

    #[tokio::test]
    async fn ending_twice_reports_none_and_saves_once() {
        let controller = memory_controller();
        controller.start(&["tree".into()], 0).await;
        assert!(controller.end(100).await.unwrap().is_some());
        assert!(controller.end(200).await.unwrap().is_none());
        assert_eq!(controller.db.list_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_frames_are_rejected() {
        let controller = memory_controller();
        controller.start(&[], 0).await;
        assert_eq!(
            controller.ingest(&[], 100).await,
            Err(ValidationError::EmptyFrame)
        );
    }

    #[tokio::test]
    async fn subscribers_observe_lifecycle_transitions() {
        let controller = memory_controller();
        let rx = controller.subscribe();

        controller.start(&["tree".into()], 0).await;
        assert_eq!(rx.borrow().state.status, TrackerStatus::Running);

        controller.pause(500).await;
        assert_eq!(rx.borrow().state.status, TrackerStatus::Paused);
        assert_eq!(rx.borrow().elapsed_secs, 0.5);

        controller.reset().await;
        assert_eq!(rx.borrow().state.status, TrackerStatus::Idle);
    }

    #[tokio::test]
    async fn out_of_order_commands_are_absorbed() {
        let controller = memory_controller();
        let snapshot = controller.pause(100).await;
        assert_eq!(snapshot.state.status, TrackerStatus::Idle);
        let snapshot = controller.resume(200).await;
        assert_eq!(snapshot.state.status, TrackerStatus::Idle);
    }
}
