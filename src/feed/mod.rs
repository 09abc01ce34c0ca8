pub mod replay;

pub use replay::{run_replay, Pacing};

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::Sample;

/// One scripted command on the feed timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum FeedCommand {
    Start { labels: Vec<String> },
    Frame { scores: Vec<Sample> },
    Pause,
    Resume,
    End,
}

/// A command plus its monotonic timestamp in milliseconds from feed zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    pub at: u64,
    #[serde(flatten)]
    pub command: FeedCommand,
}

/// Parse a JSON Lines feed script. Blank lines are skipped; events must be
/// timestamp-ordered.
pub fn load_feed(path: &Path) -> Result<Vec<FeedEvent>> {
    let file =
        File::open(path).with_context(|| format!("failed to open feed {}", path.display()))?;
    parse_feed(BufReader::new(file))
}

pub fn parse_feed(reader: impl BufRead) -> Result<Vec<FeedEvent>> {
    let mut events: Vec<FeedEvent> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read feed line {}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: FeedEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid feed event on line {}", index + 1))?;
        if let Some(previous) = events.last().map(|e| e.at) {
            if event.at < previous {
                bail!(
                    "feed is not timestamp-ordered: line {} goes back from {}ms to {}ms",
                    index + 1,
                    previous,
                    event.at
                );
            }
        }
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_a_full_command_script() {
        let script = r#"
{"at":0,"event":"start","labels":["tree","warrior"]}
{"at":16,"event":"frame","scores":[{"className":"tree","confidence":0.91}]}
{"at":5000,"event":"pause"}
{"at":7000,"event":"resume"}
{"at":9000,"event":"end"}
"#;
        let events = parse_feed(Cursor::new(script)).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0].command,
            FeedCommand::Start {
                labels: vec!["tree".into(), "warrior".into()]
            }
        );
        assert_eq!(events[1].at, 16);
        match &events[1].command {
            FeedCommand::Frame { scores } => {
                assert_eq!(scores[0].class_name, "tree");
                assert_eq!(scores[0].confidence, 0.91);
            }
            other => panic!("expected frame, got {other:?}"),
        }
        assert_eq!(events[4].command, FeedCommand::End);
    }

    #[test]
    fn rejects_out_of_order_timestamps() {
        let script = "{\"at\":100,\"event\":\"pause\"}\n{\"at\":50,\"event\":\"resume\"}\n";
        let err = parse_feed(Cursor::new(script)).unwrap_err();
        assert!(err.to_string().contains("not timestamp-ordered"));
    }

    #[test]
    fn rejects_unknown_events() {
        let script = "{\"at\":0,\"event\":\"warp\"}\n";
        assert!(parse_feed(Cursor::new(script)).is_err());
    }

    #[test]
    fn equal_timestamps_are_allowed() {
        let script = "{\"at\":0,\"event\":\"start\",\"labels\":[]}\n{\"at\":0,\"event\":\"end\"}\n";
        assert_eq!(parse_feed(Cursor::new(script)).unwrap().len(), 2);
    }
}
