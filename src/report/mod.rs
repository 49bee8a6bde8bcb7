//! Report generation module.
//!
//! Turns the full record history into a chart image and a Markdown trend
//! table. Pure batch transform; no network access.

mod chart;
mod table;

pub use chart::*;
pub use table::*;

use crate::analysis::{daily_shares, monthly_trend, DailyShare};
use crate::config::ReportConfig;
use crate::store::RecordStore;
use anyhow::{Context, Result};
use tracing::info;

/// What a report run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub dates_used: usize,
    pub dates_skipped: usize,
    /// Shares of the most recent usable date.
    pub latest: Option<DailyShare>,
    pub document_changed: bool,
}

/// Load every record, render the chart and update the trend document.
///
/// Fails without writing anything when no record has a usable total or the
/// document lacks its table markers.
pub fn generate_report(store: &RecordStore, config: &ReportConfig) -> Result<ReportOutcome> {
    let days = store.load_all()?;
    let shares = daily_shares(&days);

    if shares.is_empty() {
        anyhow::bail!(
            "No usable records in {} ({} dates found, none with a non-zero total)",
            store.dir().display(),
            days.len()
        );
    }
    info!(
        "Using {} of {} dates from {}",
        shares.len(),
        days.len(),
        store.dir().display()
    );

    // Check the document before writing anything
    let trend = monthly_trend(&shares, config.table_months);
    let table = render_trend_table(&trend);
    let updated = spliced_document(&config.document_path, &table)?;

    let series = ChartSeries::combined(&shares);
    let style = ChartStyle {
        title: config.chart_title.clone(),
        watermark: config.watermark.clone(),
        with_text: prepare_font(config.font_path.as_deref()),
    };
    render_chart(&series, &style, &config.chart_path)?;
    info!("Chart saved to {}", config.chart_path.display());

    let document_changed = updated.is_some();
    if let Some(content) = updated {
        std::fs::write(&config.document_path, content)
            .with_context(|| format!("Failed to write {}", config.document_path.display()))?;
        info!("Trend table updated in {}", config.document_path.display());
    }

    Ok(ReportOutcome {
        dates_used: shares.len(),
        dates_skipped: days.len() - shares.len(),
        latest: shares.last().cloned(),
        document_changed,
    })
}
