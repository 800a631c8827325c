use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use harvest_core::{
    assess_freshness, fingerprint, parse_published, update, PageStats, Record,
    RunEffect, RunMsg, RunState, RunStatus, RunTotals, Upsert,
};
use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{ConfigError, DetailFailurePolicy, HarvestConfig, MalformedItemPolicy};
use crate::decode::decode_output;
use crate::extract::{DetailExtractor, ExtractError, ListingExtractor, ListingItem};
use crate::fetch::Fetcher;
use crate::store::{Store, StoreError};

/// Source of "now" for `fetchedAt` stamps and staleness checks.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("invalid harvest config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid listing layout: {0}")]
    Layout(#[from] ExtractError),
    #[error("commit failed: {0}")]
    Persistence(#[source] StoreError),
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub totals: RunTotals,
}

/// Listing entry with its derived fields, ready to become a [`Record`].
struct Candidate {
    id: String,
    published_at: NaiveDateTime,
    title: String,
    excerpt: String,
    url: String,
    image_url: String,
}

enum DetailFailure {
    Cancelled,
    Transport(String),
    Structure(String),
}

pub struct Harvester {
    config: HarvestConfig,
    listing: ListingExtractor,
    detail: DetailExtractor,
    fetcher: Arc<dyn Fetcher>,
    clock: Clock,
    status: watch::Sender<RunStatus>,
}

impl Harvester {
    pub fn new(config: HarvestConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, HarvestError> {
        config.validate()?;
        let listing = ListingExtractor::new(&config.layout)?;
        let detail = DetailExtractor::new(&config.detail_container)?;
        let (status, _) = watch::channel(RunStatus::default());
        Ok(Self {
            config,
            listing,
            detail,
            fetcher,
            clock: Arc::new(Utc::now),
            status,
        })
    }

    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Status of the current or most recent run.
    pub fn status(&self) -> RunStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    /// Runs one harvest over every configured page and commits `store` once
    /// at the end, whether the run completed, hit a structural mismatch, or
    /// was cancelled. Only a failed commit is reported as an error.
    pub async fn execute(
        &self,
        store: &mut Store,
        cancel: &CancellationToken,
    ) -> Result<RunReport, HarvestError> {
        harvest_info!(
            "Harvest started: {} pages from {}",
            self.config.page_count,
            self.config.url_template
        );
        let (mut state, effects) = update(
            RunState::new(),
            RunMsg::Start {
                page_count: self.config.page_count,
            },
        );
        self.publish(&state);

        let mut queue: VecDeque<RunEffect> = effects.into();
        let mut commit_error = None;
        while let Some(effect) = queue.pop_front() {
            let mut msgs = Vec::with_capacity(2);
            match effect {
                RunEffect::FetchListing { page } => {
                    let msg = self.harvest_page(page, store, cancel).await;
                    if cancel.is_cancelled() {
                        msgs.push(RunMsg::CancelRequested);
                    }
                    msgs.push(msg);
                }
                RunEffect::Commit => match store.commit().await {
                    Ok(records) => msgs.push(RunMsg::Committed { records }),
                    Err(err) => {
                        harvest_error!("Commit failed: {}", err);
                        msgs.push(RunMsg::CommitFailed {
                            message: err.to_string(),
                        });
                        commit_error = Some(err);
                    }
                },
            }
            for msg in msgs {
                let (next, effects) = update(state, msg);
                state = next;
                queue.extend(effects);
            }
        }
        self.publish(&state);

        let report = RunReport {
            status: state.status().clone(),
            totals: *state.totals(),
        };
        match &report.status {
            RunStatus::Completed => harvest_info!(
                "Harvest completed: {} added, {} refreshed, {} cached, {} records stored",
                report.totals.added,
                report.totals.refreshed,
                report.totals.cache_hits,
                report.totals.committed_records.unwrap_or_default()
            ),
            RunStatus::Aborted { reason } => harvest_warn!("Harvest aborted: {:?}", reason),
            other => harvest_debug!("Harvest ended in unexpected status {:?}", other),
        }

        match commit_error {
            Some(err) => Err(HarvestError::Persistence(err)),
            None => Ok(report),
        }
    }

    fn publish(&self, state: &RunState) {
        self.status.send_replace(state.status().clone());
    }

    async fn harvest_page(
        &self,
        page: u32,
        store: &mut Store,
        cancel: &CancellationToken,
    ) -> RunMsg {
        let url = self.config.page_url(page);
        let skip = |reason: String| {
            harvest_warn!("Skipping page {} ({}): {}", page, url, reason);
            RunMsg::PageSkipped { page, reason }
        };

        let base = match Url::parse(&url) {
            Ok(base) => base,
            Err(err) => return skip(err.to_string()),
        };
        let output = match self.fetcher.fetch(&url, cancel).await {
            Ok(output) => output,
            Err(err) => return skip(err.to_string()),
        };
        let html = match decode_output(&output) {
            Ok(decoded) => decoded.html,
            Err(err) => return skip(err.to_string()),
        };

        let mut stats = PageStats::default();
        let fail = |stats: PageStats, reason: String| {
            harvest_error!("Structure mismatch on page {}: {}", page, reason);
            RunMsg::PageFailed {
                page,
                stats,
                reason,
            }
        };

        let items = match self.listing.extract(&html) {
            Ok(items) => items,
            Err(err) => return fail(stats, err.to_string()),
        };

        for item in items {
            let derived = item
                .map_err(|err| err.to_string())
                .and_then(|item| derive(item, &base));
            let candidate = match derived {
                Ok(candidate) => candidate,
                Err(reason) => match self.config.malformed_item {
                    MalformedItemPolicy::AbortRun => return fail(stats, reason),
                    MalformedItemPolicy::SkipItem => {
                        harvest_warn!("Skipping item on page {}: {}", page, reason);
                        stats.skipped_items += 1;
                        continue;
                    }
                },
            };

            let now = (self.clock)();
            let freshness = assess_freshness(
                store.get(&candidate.id),
                now,
                self.config.staleness_ttl(),
            );
            if !freshness.needs_fetch() {
                stats.cache_hits += 1;
                continue;
            }

            let content = match self.fetch_detail(&candidate.url, cancel).await {
                Ok(content) => content,
                Err(DetailFailure::Cancelled) => {
                    return RunMsg::PageHarvested { page, stats };
                }
                Err(DetailFailure::Structure(reason)) => return fail(stats, reason),
                Err(DetailFailure::Transport(reason)) => {
                    stats.detail_failures += 1;
                    match self.config.detail_failure {
                        DetailFailurePolicy::SkipRecord => {
                            harvest_warn!(
                                "Detail {} unavailable, retry next run: {}",
                                candidate.url,
                                reason
                            );
                            continue;
                        }
                        // A stored copy is never replaced by an empty one.
                        DetailFailurePolicy::StoreWithoutContent
                            if store.get(&candidate.id).is_some() =>
                        {
                            harvest_warn!(
                                "Detail {} unavailable, keeping stored copy: {}",
                                candidate.url,
                                reason
                            );
                            continue;
                        }
                        DetailFailurePolicy::StoreWithoutContent => {
                            harvest_warn!(
                                "Detail {} unavailable, storing without content: {}",
                                candidate.url,
                                reason
                            );
                            String::new()
                        }
                    }
                }
            };

            harvest_info!("Fetched page {} => {}", page, candidate.title);
            let record = Record {
                id: candidate.id,
                fetched_at: now,
                published_at: candidate.published_at,
                title: candidate.title,
                excerpt: candidate.excerpt,
                url: candidate.url,
                image_url: candidate.image_url,
                content,
            };
            match store.upsert(record) {
                Upsert::Inserted => stats.added += 1,
                Upsert::Replaced => stats.refreshed += 1,
            }
        }

        harvest_debug!("Page {} done: {:?}", page, stats);
        RunMsg::PageHarvested { page, stats }
    }

    async fn fetch_detail(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, DetailFailure> {
        let output = self.fetcher.fetch(url, cancel).await.map_err(|err| {
            if err.is_cancelled() {
                DetailFailure::Cancelled
            } else {
                DetailFailure::Transport(err.to_string())
            }
        })?;
        let decoded =
            decode_output(&output).map_err(|err| DetailFailure::Transport(err.to_string()))?;
        self.detail
            .extract(&decoded.html)
            .map_err(|err| DetailFailure::Structure(format!("{url}: {err}")))
    }
}

fn derive(item: ListingItem, base: &Url) -> Result<Candidate, String> {
    let published_at = parse_published(&item.date_text).map_err(|err| err.to_string())?;
    let url = base
        .join(&item.href)
        .map_err(|err| format!("link {:?}: {}", item.href, err))?;
    let host = base.host_str().unwrap_or_default();
    let image_url = format!("https://{}{}", host, item.image_src);
    Ok(Candidate {
        id: fingerprint(&item.title, &item.date_text),
        published_at,
        title: item.title,
        excerpt: item.excerpt,
        url: url.to_string(),
        image_url,
    })
}
