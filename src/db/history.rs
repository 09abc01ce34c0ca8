use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::{parse_datetime, Database};
use crate::models::{ClassDuration, HistoryEntry, SessionSummary};

/// Maximum number of saved sessions; the oldest entries are evicted first
/// once the cap is reached.
pub const HISTORY_CAP: usize = 50;

impl Database {
    /// Append a finalized summary to the history, evicting beyond the cap
    /// in the same transaction.
    pub async fn insert_summary(
        &self,
        summary: &SessionSummary,
        saved_at: DateTime<Utc>,
    ) -> Result<()> {
        let record = summary.clone();
        self.execute(move |conn| {
            let durations = serde_json::to_string(&record.durations)
                .context("failed to serialize durations")?;

            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO history (session_id, saved_at, total_secs, poses_detected, durations)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.session_id,
                    saved_at.to_rfc3339(),
                    record.total_secs,
                    record.poses_detected as i64,
                    durations,
                ],
            )
            .with_context(|| "failed to insert history entry")?;

            tx.execute(
                "DELETE FROM history
                 WHERE id NOT IN (SELECT id FROM history ORDER BY id DESC LIMIT ?1)",
                params![HISTORY_CAP as i64],
            )
            .with_context(|| "failed to evict history overflow")?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// All saved sessions, most recent first.
    pub async fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, saved_at, total_secs, poses_detected, durations
                 FROM history
                 ORDER BY id DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                let poses_detected = usize::try_from(row.get::<_, i64>(4)?)
                    .map_err(|_| anyhow!("poses_detected is negative"))?;
                let durations: Vec<ClassDuration> =
                    serde_json::from_str(&row.get::<_, String>(5)?)
                        .context("failed to parse stored durations")?;

                entries.push(HistoryEntry {
                    id: row.get(0)?,
                    saved_at: parse_datetime(&row.get::<_, String>(2)?)?,
                    summary: SessionSummary {
                        session_id: row.get(1)?,
                        total_secs: row.get(3)?,
                        poses_detected,
                        durations,
                    },
                });
            }

            Ok(entries)
        })
        .await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM history", [])
                .with_context(|| "failed to clear history")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn memory_db() -> Database {
        Database::new(PathBuf::from(":memory:")).unwrap()
    }

    fn summary(n: usize) -> SessionSummary {
        SessionSummary {
            session_id: format!("session-{n}"),
            total_secs: n as f64,
            poses_detected: 1,
            durations: vec![ClassDuration {
                label: "tree".into(),
                secs: n as f64,
            }],
        }
    }

    #[tokio::test]
    async fn summaries_round_trip_through_the_store() {
        let db = memory_db();
        let saved_at = Utc::now();
        db.insert_summary(&summary(7), saved_at).await.unwrap();

        let entries = db.list_history().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].summary.session_id, "session-7");
        assert_eq!(entries[0].summary.total_secs, 7.0);
        assert_eq!(entries[0].summary.poses_detected, 1);
        assert_eq!(entries[0].summary.durations[0].label, "tree");
        assert_eq!(entries[0].saved_at.timestamp(), saved_at.timestamp());
    }

    #[tokio::test]
    async fn saving_beyond_the_cap_evicts_oldest_first() {
        let db = memory_db();
        for n in 1..=HISTORY_CAP + 1 {
            db.insert_summary(&summary(n), Utc::now()).await.unwrap();
        }

        let entries = db.list_history().await.unwrap();
        assert_eq!(entries.len(), HISTORY_CAP);
        // Most recent first; the very first save is gone.
        assert_eq!(entries[0].summary.session_id, "session-51");
        assert_eq!(
            entries.last().unwrap().summary.session_id,
            "session-2"
        );
    }

    #[tokio::test]
    async fn clear_history_empties_the_store() {
        let db = memory_db();
        db.insert_summary(&summary(1), Utc::now()).await.unwrap();
        db.clear_history().await.unwrap();
        assert!(db.list_history().await.unwrap().is_empty());
    }
}
