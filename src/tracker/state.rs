use serde::{Deserialize, Serialize};

use crate::error::{StateError, ValidationError};
use crate::models::{ClassDuration, Sample, SessionSummary};

use super::Threshold;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackerStatus {
    Idle,
    Running,
    Paused,
    Ended,
}

impl Default for TrackerStatus {
    fn default() -> Self {
        TrackerStatus::Idle
    }
}

/// One per-class accumulator. Ledger order is class discovery order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassAccumulator {
    pub label: String,
    pub accumulated_ms: u64,
}

impl ClassAccumulator {
    pub fn secs(&self) -> f64 {
        self.accumulated_ms as f64 / 1000.0
    }
}

/// What a single ingested frame did to the accumulators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The frame's delta was added to the dominant class.
    Accumulated { label: String, delta_ms: u64 },
    /// Above threshold but the dominant class changed; accumulation
    /// re-anchors and the new class counts from this frame forward.
    Reanchored { label: String },
    /// Below threshold; the frame's delta is attributed to no class.
    BelowThreshold,
    /// Not running; the frame was observed but nothing accumulated.
    Inactive,
}

/// The duration accumulation state machine: `Idle → Running ⇄ Paused → Ended`.
///
/// All timestamps are caller-supplied monotonic milliseconds on a single time
/// base; the engine never reads a clock of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub status: TrackerStatus,
    pub session_id: Option<String>,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    pub total_paused_ms: u64,
    /// Class currently being accumulated, or none while below threshold.
    pub current_class: Option<String>,
    pub durations: Vec<ClassAccumulator>,
    /// Start of the open pause interval while paused.
    #[serde(skip)]
    pub pause_started_ms: Option<u64>,
    /// Timestamp of the last observed frame. Cleared on resume so the first
    /// frame after a pause cannot contribute a pause-wide delta.
    #[serde(skip)]
    pub last_frame_ms: Option<u64>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            status: TrackerStatus::Idle,
            session_id: None,
            started_at_ms: None,
            ended_at_ms: None,
            total_paused_ms: 0,
            current_class: None,
            durations: Vec::new(),
            pause_started_ms: None,
            last_frame_ms: None,
        }
    }
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session. Only valid from `Idle`; an ended session must
    /// be reset explicitly before it can be restarted.
    pub fn begin_session(
        &mut self,
        session_id: String,
        labels: &[String],
        now_ms: u64,
    ) -> Result<(), StateError> {
        if self.status != TrackerStatus::Idle {
            return Err(StateError::new("start", self.status));
        }

        let mut durations: Vec<ClassAccumulator> = Vec::with_capacity(labels.len());
        for label in labels {
            if !durations.iter().any(|slot| &slot.label == label) {
                durations.push(ClassAccumulator {
                    label: label.clone(),
                    accumulated_ms: 0,
                });
            }
        }

        *self = Self {
            status: TrackerStatus::Running,
            session_id: Some(session_id),
            started_at_ms: Some(now_ms),
            ended_at_ms: None,
            total_paused_ms: 0,
            current_class: None,
            durations,
            pause_started_ms: None,
            last_frame_ms: None,
        };
        Ok(())
    }

    pub fn pause(&mut self, now_ms: u64) -> Result<(), StateError> {
        if self.status != TrackerStatus::Running {
            return Err(StateError::new("pause", self.status));
        }
        self.status = TrackerStatus::Paused;
        self.pause_started_ms = Some(now_ms);
        Ok(())
    }

    pub fn resume(&mut self, now_ms: u64) -> Result<(), StateError> {
        if self.status != TrackerStatus::Paused {
            return Err(StateError::new("resume", self.status));
        }
        if let Some(pause_started) = self.pause_started_ms.take() {
            self.total_paused_ms += now_ms.saturating_sub(pause_started);
        }
        self.status = TrackerStatus::Running;
        // Whatever frame timestamp was recorded before or during the pause is
        // stale; the first frame after resume must contribute a zero delta.
        self.last_frame_ms = None;
        Ok(())
    }

    /// Feed one frame's dominant sample into the accumulators.
    ///
    /// Accepted in any state: while not running the frame is observed but
    /// accumulates nothing, so preview frames during a pause cannot corrupt
    /// durations.
    pub fn ingest(
        &mut self,
        sample: &Sample,
        frame_ms: u64,
        threshold: Threshold,
    ) -> Result<IngestOutcome, ValidationError> {
        sample.validate()?;

        let delta_ms = match (self.status, self.last_frame_ms) {
            (TrackerStatus::Running, Some(last)) => frame_ms.saturating_sub(last),
            _ => 0,
        };
        self.last_frame_ms = Some(frame_ms);

        if self.status != TrackerStatus::Running {
            return Ok(IngestOutcome::Inactive);
        }

        if !threshold.clears(sample.confidence) {
            self.current_class = None;
            return Ok(IngestOutcome::BelowThreshold);
        }

        let label = sample.class_name.clone();
        if self.current_class.as_deref() == Some(label.as_str()) {
            self.accumulator_mut(&label).accumulated_ms += delta_ms;
            Ok(IngestOutcome::Accumulated { label, delta_ms })
        } else {
            // Dominant class changed: re-anchor without attributing this
            // frame's delta, so the new class counts from here forward.
            self.accumulator_mut(&label);
            self.current_class = Some(label.clone());
            Ok(IngestOutcome::Reanchored { label })
        }
    }

    /// Elapsed active milliseconds at `now_ms`, excluding paused intervals.
    /// Saturates at zero against clock skew and freezes once ended.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let Some(started) = self.started_at_ms else {
            return 0;
        };
        let now_ms = self.ended_at_ms.unwrap_or(now_ms);
        let open_pause_ms = match (self.status, self.pause_started_ms) {
            (TrackerStatus::Paused, Some(pause_started)) => now_ms.saturating_sub(pause_started),
            _ => 0,
        };
        now_ms
            .saturating_sub(started)
            .saturating_sub(self.total_paused_ms)
            .saturating_sub(open_pause_ms)
    }

    pub fn elapsed_secs(&self, now_ms: u64) -> f64 {
        self.elapsed_ms(now_ms) as f64 / 1000.0
    }

    /// Freeze the session into an immutable summary. Valid from `Running`
    /// or `Paused`; closes any open pause interval first.
    pub fn finalize(&mut self, now_ms: u64) -> Result<SessionSummary, StateError> {
        match self.status {
            TrackerStatus::Running | TrackerStatus::Paused => {}
            status => return Err(StateError::new("end", status)),
        }

        if let Some(pause_started) = self.pause_started_ms.take() {
            self.total_paused_ms += now_ms.saturating_sub(pause_started);
        }
        self.status = TrackerStatus::Ended;
        self.ended_at_ms = Some(now_ms);

        let poses_detected = self
            .durations
            .iter()
            .filter(|slot| slot.accumulated_ms > 0)
            .count();
        let durations = self
            .durations
            .iter()
            .map(|slot| ClassDuration {
                label: slot.label.clone(),
                secs: round2(slot.secs()),
            })
            .collect();

        Ok(SessionSummary {
            session_id: self.session_id.clone().unwrap_or_default(),
            total_secs: round2(self.elapsed_secs(now_ms)),
            poses_detected,
            durations,
        })
    }

    /// Clear everything back to `Idle`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn accumulator_mut(&mut self, label: &str) -> &mut ClassAccumulator {
        let index = match self.durations.iter().position(|slot| slot.label == label) {
            Some(index) => index,
            None => {
                self.durations.push(ClassAccumulator {
                    label: label.to_string(),
                    accumulated_ms: 0,
                });
                self.durations.len() - 1
            }
        };
        &mut self.durations[index]
    }
}

fn round2(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
