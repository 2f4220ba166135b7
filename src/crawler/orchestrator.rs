//! Fetch orchestrator - drives every page index to a terminal state
//!
//! For each page index the orchestrator:
//! - waits for a slot at the admission gate
//! - sleeps a random jitter before each attempt and before the page visit
//! - renders, normalizes and persists the page
//! - retries failures after a fixed backoff, up to the attempt budget
//!
//! All indices run cooperatively on the calling task. The successful records
//! are merged into the consolidated results file once the loop is over.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::progress::{CrawlProgress, LogProgress, ProgressReporter};
use crate::crawler::state::{transition, FetchOutcome, PageState};
use crate::index::PageIndex;
use crate::normalizer::{normalize, DocRecord};
use crate::output::CrawlSummary;
use crate::renderer::{PageRenderer, RenderOutcome};
use crate::storage::ArtifactStore;
use futures::future::join_all;
use rand::Rng;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Picks a delay uniformly from an inclusive millisecond range
fn jitter((min, max): (u64, u64)) -> Duration {
    let (low, high) = (min.min(max), min.max(max));
    if high == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Crawls page indices through a [`PageRenderer`] into an [`ArtifactStore`]
pub struct CrawlOrchestrator {
    settings: CrawlerConfig,
    results_file: String,
    renderer: Arc<dyn PageRenderer>,
    store: ArtifactStore,
    reporter: Arc<dyn ProgressReporter>,
    gate: Semaphore,
    config_hash: String,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator reporting progress to the log
    pub fn new(config: &Config, renderer: Arc<dyn PageRenderer>, store: ArtifactStore) -> Self {
        let permits = config.crawler.max_concurrent_renders.max(1) as usize;

        Self {
            settings: config.crawler.clone(),
            results_file: config.output.results_file.clone(),
            renderer,
            store,
            reporter: Arc::new(LogProgress),
            gate: Semaphore::new(permits),
            config_hash: String::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Hash of the configuration, carried into the summary
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Crawls every index in `indices` to completion
    pub async fn run(&self, indices: &[PageIndex]) -> CrawlSummary {
        self.run_until(indices, std::future::pending()).await
    }

    /// Crawls `indices` until done or until `shutdown` resolves
    ///
    /// On shutdown the indices still in flight are dropped between attempts.
    /// Artifacts already written stay valid, and the records gathered so far
    /// are still merged into the results file.
    pub async fn run_until<F>(&self, indices: &[PageIndex], shutdown: F) -> CrawlSummary
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let progress = CrawlProgress::new(indices.len());
        let records = Mutex::new(BTreeMap::new());

        tracing::info!(
            "Crawling {} page indices with at most {} concurrent renders",
            indices.len(),
            self.gate.available_permits()
        );

        let crawl = join_all(
            indices
                .iter()
                .map(|index| self.crawl_index(*index, &progress, &records)),
        );

        let interrupted = tokio::select! {
            _ = crawl => false,
            _ = shutdown => {
                tracing::warn!(
                    "Shutdown requested, stopping after {}/{} indices",
                    progress.completed(),
                    progress.total()
                );
                true
            }
        };

        let records = records.into_inner().unwrap_or_else(PoisonError::into_inner);
        let results_indices = if records.is_empty() {
            None
        } else {
            match self.store.merge_results(&self.results_file, &records) {
                Ok(count) => Some(count),
                Err(e) => {
                    tracing::error!("Failed to update {}: {}", self.results_file, e);
                    None
                }
            }
        };

        let summary = CrawlSummary {
            total: progress.total(),
            succeeded: progress.succeeded(),
            empty: progress.empty(),
            abandoned: progress.abandoned(),
            elapsed: start_time.elapsed(),
            config_hash: self.config_hash.clone(),
            interrupted,
            results_indices,
            removed: None,
        };

        tracing::info!(
            "Crawl finished in {:?}: {} succeeded, {} empty, {} abandoned",
            summary.elapsed,
            summary.succeeded,
            summary.empty,
            summary.abandoned
        );

        summary
    }

    /// Drives one index to a terminal state
    ///
    /// The admission permit is held for the whole attempt loop.
    async fn crawl_index(
        &self,
        index: PageIndex,
        progress: &CrawlProgress,
        records: &Mutex<BTreeMap<PageIndex, DocRecord>>,
    ) -> PageState {
        let state = match self.gate.acquire().await {
            Ok(_permit) => self.attempt_loop(index, records).await,
            Err(e) => {
                tracing::error!("Admission gate closed before {}: {}", index, e);
                PageState::Abandoned
            }
        };

        let completed = progress.record(state);
        self.reporter
            .report(&index, state, completed, progress.total());
        state
    }

    async fn attempt_loop(
        &self,
        index: PageIndex,
        records: &Mutex<BTreeMap<PageIndex, DocRecord>>,
    ) -> PageState {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut state = PageState::initial();

        while !state.is_terminal() {
            pause(jitter(self.settings.attempt_jitter_ms)).await;

            let attempt = state.attempts().unwrap_or(0) + 1;
            tracing::debug!("Attempt {}/{} for {}", attempt, max_attempts, index);

            let outcome = self.attempt(&index).await;
            state = transition(state, &outcome, max_attempts);

            match outcome {
                FetchOutcome::Success(record) => {
                    tracing::info!("Saved {} ({})", index, record.title);
                    records
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(index, record);
                }
                FetchOutcome::EmptyPage => {
                    tracing::info!("Page {} has no documentation", index);
                }
                FetchOutcome::Failure(reason) => {
                    if state == PageState::Abandoned {
                        tracing::error!(
                            "Giving up on {} after {} attempts: {}",
                            index,
                            attempt,
                            reason
                        );
                    } else {
                        tracing::warn!(
                            "Attempt {}/{} for {} failed: {}",
                            attempt,
                            max_attempts,
                            index,
                            reason
                        );
                        pause(self.settings.retry_backoff()).await;
                    }
                }
            }
        }

        state
    }

    /// Makes one attempt and persists whatever it produced
    async fn attempt(&self, index: &PageIndex) -> FetchOutcome {
        pause(jitter(self.settings.visit_jitter_ms)).await;

        let raw = match self.renderer.render(index).await {
            Ok(RenderOutcome::Rendered(raw)) => raw,
            Ok(RenderOutcome::Empty { reason }) => {
                tracing::debug!("Render of {} came back empty: {}", index, reason);
                return self.confirm_empty(index);
            }
            Err(e) => return FetchOutcome::Failure(e.to_string()),
        };

        let record = normalize(&raw);
        if record.is_empty() {
            tracing::debug!("Normalized record of {} carries nothing", index);
            return self.confirm_empty(index);
        }

        match self.store.write_record(index, &record) {
            Ok(_) => FetchOutcome::Success(record),
            Err(e) => FetchOutcome::Failure(format!("failed to persist record: {}", e)),
        }
    }

    fn confirm_empty(&self, index: &PageIndex) -> FetchOutcome {
        match self.store.write_empty_marker(index) {
            Ok(_) => FetchOutcome::EmptyPage,
            Err(e) => FetchOutcome::Failure(format!("failed to persist empty marker: {}", e)),
        }
    }
}
