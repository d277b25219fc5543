// src/pipeline/cycle.rs

//! One fetch → filter → format → notify → persist cycle.
//!
//! The driver is schedule-agnostic: one-shot runs, the recurring loop and
//! the Lambda handler all call [`Driver::run_cycle`].

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::config::Credentials;
use crate::error::{AppError, Result};
use crate::models::{Config, DigestConfig, EmptyPolicy, Posting};
use crate::pipeline::dedup::{DedupCache, Selection, select_for_digest};
use crate::services::digest::{Digest, render};
use crate::services::{Fetcher, Notifier};
use crate::storage::CacheStore;

/// Phase of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Filtering,
    Formatting,
    Notifying,
    Persisting,
    Done,
    Failed,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::Fetching => "fetching",
            CycleState::Filtering => "filtering",
            CycleState::Formatting => "formatting",
            CycleState::Notifying => "notifying",
            CycleState::Persisting => "persisting",
            CycleState::Done => "done",
            CycleState::Failed => "failed",
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-cycle settings, extracted from [`Config`] and [`Credentials`].
#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub query: String,
    pub date_window_days: Option<u32>,
    pub recipient: String,
    pub max_entries: usize,
    pub fallback_count: usize,
    pub digest: DigestConfig,
}

impl CycleOptions {
    pub fn from_config(config: &Config, credentials: &Credentials) -> Self {
        Self {
            query: config.search.query.clone(),
            date_window_days: config.search.date_window_days,
            recipient: credentials.recipient.clone(),
            max_entries: config.cache.max_entries,
            fallback_count: config.cache.fallback_count,
            digest: config.digest.clone(),
        }
    }

    /// Lower date bound for the search, if windowing is enabled.
    pub fn since(&self, today: NaiveDate) -> Result<Option<NaiveDate>> {
        let Some(days) = self.date_window_days else {
            return Ok(None);
        };
        today
            .checked_sub_days(Days::new(u64::from(days)))
            .map(Some)
            .ok_or_else(|| {
                AppError::config(format!("date window of {days} days is out of range"))
            })
    }
}

/// Summary of a finished cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// `Done` or `Failed`
    pub state: CycleState,
    /// Phase that failed, when `state == Failed`
    pub failed_phase: Option<CycleState>,
    pub error: Option<String>,
    pub fetched: usize,
    /// Identifiers included in the sent digest
    pub notified: Vec<String>,
    pub fallback_used: bool,
    /// True when the empty policy suppressed delivery
    pub delivery_skipped: bool,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            state: CycleState::Idle,
            failed_phase: None,
            error: None,
            fetched: 0,
            notified: Vec::new(),
            fallback_used: false,
            delivery_skipped: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == CycleState::Done
    }
}

/// Result of a dry run: what would be sent.
#[derive(Debug, Clone)]
pub struct Preview {
    pub fetched: usize,
    pub selection: Selection,
    pub digest: Digest,
}

/// Runs cycles against injected collaborators.
pub struct Driver {
    options: CycleOptions,
    fetcher: Box<dyn Fetcher>,
    notifier: Box<dyn Notifier>,
    store: Box<dyn CacheStore>,
}

impl Driver {
    pub fn new(
        options: CycleOptions,
        fetcher: Box<dyn Fetcher>,
        notifier: Box<dyn Notifier>,
        store: Box<dyn CacheStore>,
    ) -> Self {
        Self {
            options,
            fetcher,
            notifier,
            store,
        }
    }

    pub fn options(&self) -> &CycleOptions {
        &self.options
    }

    /// Run one cycle now. Never returns an error; failures end in `Failed`.
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle as if the current time were `now`.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::new();

        match self.execute(now, &mut report).await {
            Ok(()) => {
                transition(&mut report, CycleState::Done);
                log::info!(
                    "Cycle done: {} fetched, {} notified{}{}",
                    report.fetched,
                    report.notified.len(),
                    if report.fallback_used { " (fallback)" } else { "" },
                    if report.delivery_skipped { " (delivery skipped)" } else { "" },
                );
            }
            Err(e) => {
                let phase = report.state;
                log::error!("Cycle failed while {}: {}", phase, e);
                report.failed_phase = Some(phase);
                report.error = Some(e.to_string());
                transition(&mut report, CycleState::Failed);
            }
        }

        report
    }

    async fn execute(&self, now: DateTime<Utc>, report: &mut CycleReport) -> Result<()> {
        let today = now.date_naive();

        transition(report, CycleState::Fetching);
        let fetched = self.fetch(today).await?;
        report.fetched = fetched.len();

        transition(report, CycleState::Filtering);
        let cache = DedupCache::new(self.store.load().await, self.options.max_entries);
        let selection = select_for_digest(&cache, &fetched, self.options.fallback_count);
        report.fallback_used = selection.fallback;

        if selection.fallback {
            log::info!(
                "No new jobs among {} fetched; re-sending {}",
                fetched.len(),
                selection.postings.len()
            );
        }

        // The placeholder digest is only for an empty search, not for "nothing new".
        let skip = !fetched.is_empty() || self.options.digest.empty_policy == EmptyPolicy::Skip;
        if selection.postings.is_empty() && skip {
            log::info!("Nothing to send; skipping delivery");
            report.delivery_skipped = true;
            return Ok(());
        }

        transition(report, CycleState::Formatting);
        let digest = render(&selection.postings, &self.options.digest, today);

        transition(report, CycleState::Notifying);
        self.notifier
            .send(&self.options.recipient, &digest.subject, &digest.html)
            .await?;

        let ids: Vec<String> = selection.postings.iter().map(Posting::identifier).collect();
        report.notified = ids.clone();

        transition(report, CycleState::Persisting);
        if !ids.is_empty() {
            let cache = cache.append(ids);
            self.store.persist(cache.entries()).await?;
        }

        Ok(())
    }

    /// Fetch, filter and format without sending or persisting.
    pub async fn preview(&self) -> Result<Preview> {
        let today = Utc::now().date_naive();
        let fetched = self.fetch(today).await?;

        let cache = DedupCache::new(self.store.load().await, self.options.max_entries);
        let selection = select_for_digest(&cache, &fetched, self.options.fallback_count);
        let digest = render(&selection.postings, &self.options.digest, today);

        Ok(Preview {
            fetched: fetched.len(),
            selection,
            digest,
        })
    }

    async fn fetch(&self, today: NaiveDate) -> Result<Vec<Posting>> {
        let since = self.options.since(today)?;
        self.fetcher
            .fetch(&self.options.query, since)
            .await
            .map_err(|e| match e {
                AppError::Fetch { .. } => e,
                other => AppError::fetch(other),
            })
    }
}

fn transition(report: &mut CycleReport, next: CycleState) {
    log::debug!("Cycle state: {} -> {}", report.state, next);
    report.state = next;
}
