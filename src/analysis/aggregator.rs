//! Percentage aggregation over collected records.
//!
//! This module turns raw daily counts into per-date agent shares and
//! monthly averages of those shares.

use crate::agents::{all_keys, DISPLAY_GROUPS};
use crate::models::DayCounts;
use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Agent shares of one usable date, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyShare {
    pub date: NaiveDate,
    pub total: u64,
    /// One entry per display group, in [`DISPLAY_GROUPS`] order.
    pub by_agent: Vec<(&'static str, f64)>,
    /// Share of all agent keys together.
    pub combined: f64,
}

/// `count / total × 100`.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

/// Compute the shares of one date, or `None` if its total is missing or zero.
pub fn daily_share(day: &DayCounts) -> Option<DailyShare> {
    let total = day.total().filter(|t| *t > 0)?;

    let by_agent: Vec<(&'static str, f64)> = DISPLAY_GROUPS
        .iter()
        .map(|(name, keys)| {
            let count: u64 = keys.iter().map(|key| day.count(key)).sum();
            (*name, percentage(count, total))
        })
        .collect();

    let combined_count: u64 = all_keys().map(|key| day.count(key)).sum();

    Some(DailyShare {
        date: day.date,
        total,
        by_agent,
        combined: percentage(combined_count, total),
    })
}

/// Shares of every usable date, ascending by date.
///
/// Dates with a missing or zero total have not been collected completely
/// and are left out.
pub fn daily_shares(days: &[DayCounts]) -> Vec<DailyShare> {
    let mut shares: Vec<DailyShare> = days
        .iter()
        .filter_map(|day| {
            let share = daily_share(day);
            if share.is_none() {
                debug!("Skipping {}: missing or zero total", day.date);
            }
            share
        })
        .collect();

    shares.sort_by_key(|s| s.date);
    shares
}

/// First day of the month a date falls in.
fn month_of(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Every month from `first` to `last` inclusive, as first-of-month dates.
pub fn month_span(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let mut month = month_of(first);
    let last = month_of(last);

    while month <= last {
        months.push(month);
        match month.checked_add_months(Months::new(1)) {
            Some(next) => month = next,
            None => break,
        }
    }

    months
}

/// One table row: a name and its mean share per month.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub name: String,
    /// `None` for months without any usable date.
    pub means: Vec<Option<f64>>,
}

/// Monthly means of daily shares.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTrend {
    /// Month labels, `YYYY-MM`, ascending.
    pub months: Vec<String>,
    /// Agent rows, highest mean in the latest month first.
    pub agents: Vec<TrendRow>,
    /// Combined share of all agents.
    pub combined: TrendRow,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Average the daily shares per calendar month.
///
/// Covers the contiguous months between the first and last usable dates,
/// limited to the most recent `max_months`. Agent rows are ordered by their
/// mean in the latest month, descending; ties keep display order.
pub fn monthly_trend(shares: &[DailyShare], max_months: usize) -> MonthlyTrend {
    let (Some(first), Some(last)) = (shares.first(), shares.last()) else {
        return MonthlyTrend {
            months: Vec::new(),
            agents: Vec::new(),
            combined: TrendRow {
                name: "All agents".to_string(),
                means: Vec::new(),
            },
        };
    };

    let mut months = month_span(first.date, last.date);
    if max_months > 0 && months.len() > max_months {
        months.drain(..months.len() - max_months);
    }

    let mut by_month: BTreeMap<NaiveDate, Vec<&DailyShare>> = BTreeMap::new();
    for share in shares {
        by_month.entry(month_of(share.date)).or_default().push(share);
    }

    let month_values = |pick: &dyn Fn(&DailyShare) -> f64| -> Vec<Option<f64>> {
        months
            .iter()
            .map(|month| {
                let values: Vec<f64> = by_month
                    .get(month)
                    .map(|days| days.iter().map(|d| pick(d)).collect())
                    .unwrap_or_default();
                mean(&values)
            })
            .collect()
    };

    let mut agents: Vec<TrendRow> = DISPLAY_GROUPS
        .iter()
        .enumerate()
        .map(|(idx, (name, _))| TrendRow {
            name: name.to_string(),
            means: month_values(&|d: &DailyShare| d.by_agent[idx].1),
        })
        .collect();

    let latest = |row: &TrendRow| row.means.last().copied().flatten().unwrap_or(0.0);
    agents.sort_by(|a, b| latest(b).total_cmp(&latest(a)));

    MonthlyTrend {
        months: months
            .iter()
            .map(|m| format!("{:04}-{:02}", m.year(), m.month()))
            .collect(),
        agents,
        combined: TrendRow {
            name: "All agents".to_string(),
            means: month_values(&|d: &DailyShare| d.combined),
        },
    }
}
