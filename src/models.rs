//! Data models for the commit tracker.
//!
//! This module contains the core data structures shared by the collector
//! and the reporter: agent definitions, daily records, their flat CSV rows
//! and the hourly windows used during collection.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Query label of the row holding the total public commit count.
pub const TOTAL_LABEL: &str = "total";

/// Number of one-hour windows a day is split into.
pub const WINDOWS_PER_DAY: usize = 24;

/// An AI coding agent whose commits can be found through a search signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agent {
    /// Display name.
    pub name: &'static str,
    /// Short identifier used as the query label in records.
    pub key: &'static str,
    /// Search query fragment matching this agent's commits.
    pub query: &'static str,
}

/// Counts collected for a single UTC date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRecord {
    /// The calendar date (UTC).
    pub date: NaiveDate,
    /// Total public commits, summed over the hourly windows.
    pub total: u64,
    /// Per-agent counts, in collection order.
    pub agent_counts: Vec<(String, u64)>,
}

impl DailyRecord {
    /// Creates an empty record for a date.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            total: 0,
            agent_counts: Vec::new(),
        }
    }

    /// Flattens the record into `(date, query, count)` rows, total first.
    pub fn to_rows(&self) -> Vec<RecordRow> {
        let date = self.date.format("%Y-%m-%d").to_string();
        let mut rows = Vec::with_capacity(self.agent_counts.len() + 1);

        rows.push(RecordRow {
            date: date.clone(),
            query: TOTAL_LABEL.to_string(),
            count: self.total,
        });

        for (key, count) in &self.agent_counts {
            rows.push(RecordRow {
                date: date.clone(),
                query: key.clone(),
                count: *count,
            });
        }

        rows
    }

    /// One-line console summary of the record.
    pub fn summary_line(&self) -> String {
        let agents = self
            .agent_counts
            .iter()
            .map(|(key, count)| format!("{}={}", key, count))
            .collect::<Vec<_>>()
            .join(" ");

        format!("{} total={} | {}", self.date, self.total, agents)
    }
}

/// One persisted CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub date: String,
    pub query: String,
    pub count: u64,
}

/// Counts loaded back from the store for one date, keyed by query label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCounts {
    pub date: NaiveDate,
    pub counts: HashMap<String, u64>,
}

impl DayCounts {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            counts: HashMap::new(),
        }
    }

    /// Returns the total count, if the record has one.
    pub fn total(&self) -> Option<u64> {
        self.counts.get(TOTAL_LABEL).copied()
    }

    /// Returns the count for a label. A label that was never recorded counts
    /// as zero, the same as a queried zero.
    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }
}

/// A half-open one-hour UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Splits a date into its 24 contiguous hourly windows.
    pub fn for_day(date: NaiveDate) -> Vec<TimeWindow> {
        let midnight = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));

        (0..WINDOWS_PER_DAY as i64)
            .map(|hour| {
                let start = midnight + Duration::hours(hour);
                TimeWindow {
                    start,
                    end: start + Duration::hours(1),
                }
            })
            .collect()
    }

    /// Inclusive range expression for the search API.
    ///
    /// The API treats both bounds as inclusive, so the upper bound is the
    /// last second before `end`.
    pub fn query_range(&self) -> String {
        let last = self.end - Duration::seconds(1);
        format!(
            "{}..{}",
            self.start.format("%Y-%m-%dT%H:%M:%SZ"),
            last.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} UTC",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_day_has_24_contiguous_windows() {
        let windows = TimeWindow::for_day(date("2026-02-14"));
        assert_eq!(windows.len(), WINDOWS_PER_DAY);

        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }

        assert_eq!(windows[0].to_string(), "00:00-01:00 UTC");
        assert_eq!(
            windows[23].end,
            Utc.from_utc_datetime(&date("2026-02-15").and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_window_query_range() {
        let windows = TimeWindow::for_day(date("2026-02-14"));
        assert_eq!(
            windows[0].query_range(),
            "2026-02-14T00:00:00Z..2026-02-14T00:59:59Z"
        );
        assert_eq!(
            windows[23].query_range(),
            "2026-02-14T23:00:00Z..2026-02-14T23:59:59Z"
        );
    }

    #[test]
    fn test_record_rows_total_first() {
        let record = DailyRecord {
            date: date("2026-02-14"),
            total: 1000,
            agent_counts: vec![("claude".to_string(), 10), ("codex".to_string(), 3)],
        };

        let rows = record.to_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].query, TOTAL_LABEL);
        assert_eq!(rows[0].count, 1000);
        assert_eq!(rows[1].date, "2026-02-14");
        assert_eq!(rows[2].query, "codex");
        assert_eq!(record.summary_line(), "2026-02-14 total=1000 | claude=10 codex=3");
    }

    #[test]
    fn test_day_counts_absent_label_is_zero() {
        let mut day = DayCounts {
            date: date("2026-02-14"),
            counts: HashMap::new(),
        };
        assert_eq!(day.total(), None);
        assert_eq!(day.count("claude"), 0);

        day.counts.insert(TOTAL_LABEL.to_string(), 42);
        assert_eq!(day.total(), Some(42));
    }
}
