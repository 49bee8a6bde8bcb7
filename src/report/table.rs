//! Markdown trend table generation.
//!
//! This module renders the monthly trend as a Markdown table and splices it
//! into a host document between two sentinel comments.

use crate::analysis::{MonthlyTrend, TrendRow};
use anyhow::{Context, Result};
use std::path::Path;

/// Sentinel opening the generated region.
pub const TABLE_START: &str = "<!-- recent-table-start -->";

/// Sentinel closing the generated region.
pub const TABLE_END: &str = "<!-- recent-table-end -->";

/// Shares below this many percent render as [`NEGLIGIBLE`].
pub const EPSILON: f64 = 0.005;

/// Cell for a measured but negligible share.
pub const NEGLIGIBLE: &str = "-";

/// Cell for a month without any usable date.
pub const NO_DATA: &str = "n/a";

/// Format one table cell.
pub fn format_cell(value: Option<f64>) -> String {
    match value {
        None => NO_DATA.to_string(),
        Some(v) if v < EPSILON => NEGLIGIBLE.to_string(),
        Some(v) => format!("{:.2}%", v),
    }
}

fn render_row(row: &TrendRow, bold: bool) -> String {
    let wrap = |s: String| if bold { format!("**{}**", s) } else { s };

    let mut line = format!("| {} |", wrap(row.name.clone()));
    for value in &row.means {
        line.push_str(&format!(" {} |", wrap(format_cell(*value))));
    }
    line.push('\n');
    line
}

/// Render the trend as a Markdown table: month header, one row per agent,
/// and a bold row for all agents combined.
pub fn render_trend_table(trend: &MonthlyTrend) -> String {
    let mut table = String::new();

    table.push_str("| Agent |");
    for month in &trend.months {
        table.push_str(&format!(" {} |", month));
    }
    table.push('\n');

    table.push_str("|:---|");
    for _ in &trend.months {
        table.push_str("---:|");
    }
    table.push('\n');

    for row in &trend.agents {
        table.push_str(&render_row(row, false));
    }
    table.push_str(&render_row(&trend.combined, true));

    table
}

/// Replace everything between the sentinels with `table`.
///
/// The sentinels and everything outside them are kept byte for byte, so
/// splicing the same table twice yields the same document.
pub fn splice_table(document: &str, table: &str) -> Result<String> {
    let start = document
        .find(TABLE_START)
        .with_context(|| format!("Missing table start marker `{}`", TABLE_START))?;
    let body_start = start + TABLE_START.len();

    let body_end = document[body_start..]
        .find(TABLE_END)
        .map(|offset| body_start + offset)
        .with_context(|| format!("Missing table end marker `{}` after start marker", TABLE_END))?;

    let mut output = String::with_capacity(document.len() + table.len());
    output.push_str(&document[..body_start]);
    output.push('\n');
    output.push_str(table.trim_end_matches('\n'));
    output.push('\n');
    output.push_str(&document[body_end..]);

    Ok(output)
}

/// Splice `table` into the document at `path`.
///
/// Returns the new content, or `None` when the document would not change.
/// Nothing is written.
pub fn spliced_document(path: &Path, table: &str) -> Result<Option<String>> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let updated = splice_table(&document, table)
        .with_context(|| format!("Cannot update {}", path.display()))?;

    Ok((updated != document).then_some(updated))
}
