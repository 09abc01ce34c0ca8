use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::SessionSummary;

/// Render a summary as a CSV table: one row per class in discovery order,
/// then a trailing total row. Durations carry 2 decimal places, percentages
/// 1; every percentage is 0.0 when nothing was accumulated.
pub fn summary_csv(summary: &SessionSummary) -> String {
    let total: f64 = summary.durations.iter().map(|d| d.secs).sum();

    let mut out = String::from("pose,duration_secs,percent\n");
    for duration in &summary.durations {
        let percent = if total > 0.0 {
            duration.secs / total * 100.0
        } else {
            0.0
        };
        let _ = writeln!(
            out,
            "{},{:.2},{:.1}",
            escape_field(&duration.label),
            duration.secs,
            percent
        );
    }

    let total_percent = if total > 0.0 { 100.0 } else { 0.0 };
    let _ = writeln!(out, "total,{total:.2},{total_percent:.1}");
    out
}

pub fn write_csv(summary: &SessionSummary, path: &Path) -> Result<()> {
    std::fs::write(path, summary_csv(summary))
        .with_context(|| format!("failed to write CSV export to {}", path.display()))
}

/// Quote a label that would break the row; pose class names are free text.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
