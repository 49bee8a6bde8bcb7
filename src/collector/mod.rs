//! Daily commit count collection.
//!
//! Each date is collected strictly in sequence: the 24 hourly total queries
//! first, then one query per agent. A record is written only after all 25
//! queries for its date succeeded, so an aborted run leaves earlier dates
//! intact and never writes a partial day.

use crate::agents::AGENTS;
use crate::github::retry::Retried;
use crate::github::{with_retry, RetryPolicy, SearchApi, SearchError};
use crate::models::{Agent, DailyRecord, TimeWindow, TOTAL_LABEL, WINDOWS_PER_DAY};
use crate::store::RecordStore;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Search query counting every public commit inside a window.
pub fn window_query(window: &TimeWindow) -> String {
    format!("is:public committer-date:{}", window.query_range())
}

/// Search query counting one agent's public commits on a date.
pub fn agent_query(agent: &Agent, date: NaiveDate) -> String {
    format!(
        "is:public {} committer-date:{}",
        agent.query,
        date.format("%Y-%m-%d")
    )
}

/// Every date of the inclusive range `start..=end`.
pub fn dates_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Every query issued for a date, labelled, in issue order.
pub fn planned_queries(date: NaiveDate) -> Vec<(String, String)> {
    let windows = TimeWindow::for_day(date)
        .into_iter()
        .map(|w| (format!("{} {}", TOTAL_LABEL, w), window_query(&w)));
    let agents = AGENTS
        .iter()
        .map(|a| (a.key.to_string(), agent_query(a, date)));

    windows.chain(agents).collect()
}

/// Result of a collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    pub collected: Vec<DailyRecord>,
    pub skipped: Vec<NaiveDate>,
    /// Throttle retries spent across the run.
    pub retries: u32,
}

/// Collects daily records from a [`SearchApi`] into a [`RecordStore`].
pub struct Collector<'a, S: SearchApi> {
    api: &'a S,
    store: &'a RecordStore,
    agents: &'a [Agent],
    retry: RetryPolicy,
    show_progress: bool,
}

impl<'a, S: SearchApi> Collector<'a, S> {
    pub fn new(api: &'a S, store: &'a RecordStore) -> Self {
        Self {
            api,
            store,
            agents: AGENTS,
            retry: RetryPolicy::default(),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Collect and persist every date of `start..=end`, in order.
    ///
    /// The first fatal error aborts the run. Dates finished before it keep
    /// their record files.
    pub async fn collect_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        skip_existing: bool,
    ) -> Result<CollectSummary> {
        let mut summary = CollectSummary::default();

        for date in dates_in_range(start, end) {
            if skip_existing && self.store.contains(date) {
                info!("Skipping {} (record exists)", date);
                summary.skipped.push(date);
                continue;
            }

            let (record, retries) = self.collect_day(date).await?;
            let path = self.store.write(&record)?;
            debug!("Saved {}", path.display());

            println!("📅 {}", record.summary_line());

            summary.retries += retries;
            summary.collected.push(record);
        }

        Ok(summary)
    }

    /// Run all queries for one date without persisting anything.
    ///
    /// Returns the record and the number of throttle retries it took.
    pub async fn collect_day(&self, date: NaiveDate) -> Result<(DailyRecord, u32)> {
        info!("Collecting {}", date);

        let progress = self.progress_bar(date);
        let mut record = DailyRecord::new(date);
        let mut retries = 0;

        for window in TimeWindow::for_day(date) {
            let label = format!("{} {}", TOTAL_LABEL, window);
            let counted = self.count(&window_query(&window), &label).await;
            let counted = counted.with_context(|| format!("{}: query '{}' failed", date, label))?;

            debug!("{} {}: {}", date, window, counted.value);
            record.total += counted.value;
            retries += counted.retries;
            progress.inc(1);
        }

        for agent in self.agents {
            let counted = self.count(&agent_query(agent, date), agent.key).await;
            let counted =
                counted.with_context(|| format!("{}: query '{}' failed", date, agent.key))?;

            record.agent_counts.push((agent.key.to_string(), counted.value));
            retries += counted.retries;
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok((record, retries))
    }

    async fn count(&self, query: &str, label: &str) -> Result<Retried<u64>, SearchError> {
        let api = self.api;
        with_retry(self.retry, label, move || async move {
            api.count(query).await.map(|c| c.total_count)
        })
        .await
    }

    fn progress_bar(&self, date: NaiveDate) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new((WINDOWS_PER_DAY + self.agents.len()) as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(date.to_string());
        pb
    }
}

#[cfg(test)]
impl<'a, S: SearchApi> Collector<'a, S> {
    /// Query a different agent list.
    pub fn with_agents(mut self, agents: &'a [Agent]) -> Self {
        self.agents = agents;
        self
    }
}
