pub mod db;
pub mod error;
pub mod export;
pub mod feed;
pub mod models;
pub mod settings;
pub mod tracker;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use db::Database;
use feed::Pacing;
use settings::SettingsStore;

pub use error::{StateError, ValidationError};
pub use models::{ClassDuration, HistoryEntry, Sample, SessionSummary};
pub use tracker::{
    IngestOutcome, Threshold, TrackerController, TrackerSnapshot, TrackerState, TrackerStatus,
};

const USAGE: &str = "usage: posetrack <feed.jsonl> [--export <path>] [--realtime]\n       posetrack history";

struct CliArgs {
    feed_path: Option<String>,
    export_path: Option<String>,
    pacing: Pacing,
    show_history: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let Some(first) = args.first() else {
        bail!("{USAGE}");
    };

    if first == "history" {
        return Ok(CliArgs {
            feed_path: None,
            export_path: None,
            pacing: Pacing::Instant,
            show_history: true,
        });
    }

    let mut export_path = None;
    let mut pacing = Pacing::Instant;
    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--export" => {
                export_path = Some(
                    rest.next()
                        .ok_or_else(|| anyhow!("--export requires a path\n{USAGE}"))?
                        .clone(),
                );
            }
            "--realtime" => pacing = Pacing::Realtime,
            other => bail!("unknown argument '{other}'\n{USAGE}"),
        }
    }

    Ok(CliArgs {
        feed_path: Some(first.clone()),
        export_path,
        pacing,
        show_history: false,
    })
}

fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("POSETRACK_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("posetrack"))
        .ok_or_else(|| anyhow!("could not resolve a data directory; set POSETRACK_DATA_DIR"))
}

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let data_dir = data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let database = Database::new(data_dir.join("posetrack.sqlite3"))?;

    if cli.show_history {
        return print_history(&database).await;
    }

    let feed_path = cli
        .feed_path
        .ok_or_else(|| anyhow!("missing feed path\n{USAGE}"))?;

    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    let controller = TrackerController::new(database, settings.threshold());

    let events = feed::load_feed(Path::new(&feed_path))?;
    info!("replaying {} feed events", events.len());

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let summary = feed::run_replay(&events, &controller, cancel_token, cli.pacing).await?;

    let Some(summary) = summary else {
        warn!("feed never started a session; nothing to report");
        return Ok(());
    };

    println!(
        "session {}: {:.2}s elapsed, {} poses detected",
        summary.session_id, summary.total_secs, summary.poses_detected
    );
    match cli.export_path {
        Some(path) => {
            export::write_csv(&summary, Path::new(&path))?;
            info!("CSV export written to {path}");
        }
        None => print!("{}", export::summary_csv(&summary)),
    }

    Ok(())
}

async fn print_history(database: &Database) -> Result<()> {
    let entries = database.list_history().await?;
    if entries.is_empty() {
        println!("no saved sessions");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {}  {:.2}s  {} poses",
            entry.saved_at.format("%Y-%m-%d %H:%M:%S"),
            entry.summary.session_id,
            entry.summary.total_secs,
            entry.summary.poses_detected
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_args_requires_a_command() {
        assert!(parse_args(&[]).is_err());
    }

    #[test]
    fn parse_args_reads_feed_and_flags() {
        let cli = parse_args(&strings(&["feed.jsonl", "--export", "out.csv", "--realtime"]))
            .unwrap();
        assert_eq!(cli.feed_path.as_deref(), Some("feed.jsonl"));
        assert_eq!(cli.export_path.as_deref(), Some("out.csv"));
        assert_eq!(cli.pacing, Pacing::Realtime);
        assert!(!cli.show_history);
    }

    #[test]
    fn parse_args_recognizes_history() {
        let cli = parse_args(&strings(&["history"])).unwrap();
        assert!(cli.show_history);
    }

    #[test]
    fn parse_args_rejects_unknown_flags() {
        assert!(parse_args(&strings(&["feed.jsonl", "--bogus"])).is_err());
        assert!(parse_args(&strings(&["feed.jsonl", "--export"])).is_err());
    }
}
