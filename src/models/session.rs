use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated time for one pose class, as reported to presenters and
/// exporters. Order within a summary is class discovery order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassDuration {
    pub label: String,
    pub secs: f64,
}

/// Immutable end-of-session report produced by finalizing a tracking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    /// Elapsed seconds excluding paused intervals, rounded to 2 decimals.
    pub total_secs: f64,
    /// Number of classes that accumulated any time at all.
    pub poses_detected: usize,
    pub durations: Vec<ClassDuration>,
}

/// A summary as stored in the history table, plus the wall-clock timestamp
/// assigned when it was saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: SessionSummary,
}
