use anyhow::Result;
use log::{info, warn};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::models::SessionSummary;
use crate::tracker::TrackerController;

use super::{FeedCommand, FeedEvent};

/// How replay maps feed timestamps onto wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep out the gaps between events, as a live camera would deliver them.
    Realtime,
    /// Apply every event immediately; timestamps stay virtual.
    Instant,
}

/// Drive the controller through a feed script. Cancellation is cooperative;
/// a cancelled or `end`-less feed still finalizes at the last seen timestamp
/// so a started session always yields a summary.
pub async fn run_replay(
    events: &[FeedEvent],
    controller: &TrackerController,
    cancel_token: CancellationToken,
    pacing: Pacing,
) -> Result<Option<SessionSummary>> {
    let mut last_at: Option<u64> = None;
    let mut summary: Option<SessionSummary> = None;

    for event in events {
        if pacing == Pacing::Realtime {
            let gap = Duration::from_millis(event.at.saturating_sub(last_at.unwrap_or(event.at)));
            tokio::select! {
                _ = sleep(gap) => {}
                _ = cancel_token.cancelled() => {
                    info!("replay cancelled before {}ms", event.at);
                    break;
                }
            }
        } else if cancel_token.is_cancelled() {
            info!("replay cancelled before {}ms", event.at);
            break;
        }
        last_at = Some(event.at);

        match &event.command {
            FeedCommand::Start { labels } => {
                controller.start(labels, event.at).await;
            }
            FeedCommand::Frame { scores } => {
                if let Err(err) = controller.ingest(scores, event.at).await {
                    warn!("dropped frame at {}ms: {err}", event.at);
                }
            }
            FeedCommand::Pause => {
                controller.pause(event.at).await;
            }
            FeedCommand::Resume => {
                controller.resume(event.at).await;
            }
            FeedCommand::End => {
                if let Some(finished) = controller.end(event.at).await? {
                    summary = Some(finished);
                }
            }
        }
    }

    if summary.is_none() {
        if let Some(last) = last_at {
            if let Some(finished) = controller.end(last).await? {
                summary = Some(finished);
            }
        }
    }

    Ok(summary)
}
