//! Selection → fetch → normalize, with superseded-request handling.
//!
//! Every user action builds a fresh [`Selection`] and takes a new
//! [`RequestTicket`] from the shared [`RequestTracker`]. Taking a ticket makes
//! every older ticket stale. In-flight work is never cancelled; a stale run
//! finishes its fetch and then throws the rows away instead of returning
//! them.

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::fetch::{FetchReport, PairReport, ResultFetcher};
use crate::metadata::MetadataRegistry;
use crate::normalize::{NormalizationEngine, NormalizeOutcome, NormalizedBatch, SkippedGroup};
use crate::query::QueryBuilder;
use crate::selection::{ResolvedSelection, Selection};
use crate::sources::RowSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Proof of which request generation a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Monotonic request generation counter.
#[derive(Debug, Default)]
pub struct RequestTracker {
    current: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding all earlier tickets.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket {
            generation: self.current.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Whether no newer request has started since `ticket` was issued.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.generation
    }

    pub fn current_generation(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// A completed, current run that produced components.
#[derive(Debug)]
pub struct PipelineResult {
    /// `None` for untracked runs
    pub ticket: Option<RequestTicket>,
    pub batch: NormalizedBatch,
    /// Pairs whose query failed; they are absent from the batch
    pub failures: Vec<PairReport>,
}

/// How a run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// At least one component was produced.
    Ready(PipelineResult),
    /// Nothing matched the selection.
    NoData {
        skipped: Vec<SkippedGroup>,
        failures: Vec<PairReport>,
    },
    /// A newer request started while this one was running.
    Superseded { ticket: RequestTicket },
}

/// The full query path for one service.
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    registry: Arc<MetadataRegistry>,
    fetcher: ResultFetcher,
    engine: NormalizationEngine,
    tracker: Arc<RequestTracker>,
}

impl QueryPipeline {
    /// Wires a pipeline from service configuration.
    pub fn new(
        registry: Arc<MetadataRegistry>,
        source: Arc<dyn RowSource>,
        config: &ServiceConfig,
    ) -> Self {
        let builder = QueryBuilder::new(registry.clone(), config.catalog.clone());
        let fetcher = ResultFetcher::new(source, builder)
            .with_max_concurrent_queries(config.max_concurrent_queries);
        let engine = NormalizationEngine::new(registry.clone(), config.catalog.clone())
            .with_mixed_unit_policy(config.mixed_unit_policy);
        Self::from_parts(registry, fetcher, engine)
    }

    pub fn from_parts(
        registry: Arc<MetadataRegistry>,
        fetcher: ResultFetcher,
        engine: NormalizationEngine,
    ) -> Self {
        Self {
            registry,
            fetcher,
            engine,
            tracker: Arc::new(RequestTracker::new()),
        }
    }

    /// Shares an existing tracker, so several pipelines supersede each other.
    pub fn with_tracker(mut self, tracker: Arc<RequestTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<RequestTracker> {
        &self.tracker
    }

    /// Takes a new ticket.
    pub fn begin(&self) -> RequestTicket {
        self.tracker.begin()
    }

    pub fn resolve(&self, selection: &Selection) -> Result<ResolvedSelection> {
        selection.resolve(&self.registry)
    }

    /// Fetches raw rows without normalizing them.
    pub async fn fetch_raw(&self, selection: &Selection) -> Result<FetchReport> {
        let resolved = self.resolve(selection)?;
        Ok(self.fetcher.fetch_selection(&resolved).await)
    }

    /// Runs the selection under a fresh ticket.
    pub async fn submit(&self, selection: &Selection) -> Result<PipelineOutcome> {
        let ticket = self.begin();
        self.run(selection, ticket).await
    }

    /// Runs the selection under `ticket`.
    ///
    /// Unknown names fail the run. When every pair's query fails, the first
    /// failure is returned as the error; partial failures are reported in the
    /// outcome next to the data that did arrive.
    #[instrument(skip_all, fields(generation = ticket.generation(), pairs = selection.pairs().len()))]
    pub async fn run(&self, selection: &Selection, ticket: RequestTicket) -> Result<PipelineOutcome> {
        self.process(selection, Some(ticket)).await
    }

    /// Runs the selection without supersession tracking.
    ///
    /// Independent callers, such as concurrent HTTP requests, use this so
    /// that one caller's request never discards another's.
    #[instrument(skip_all, fields(pairs = selection.pairs().len()))]
    pub async fn execute(&self, selection: &Selection) -> Result<PipelineOutcome> {
        self.process(selection, None).await
    }

    fn is_stale(&self, ticket: Option<RequestTicket>) -> bool {
        ticket.is_some_and(|t| !self.tracker.is_current(&t))
    }

    async fn process(
        &self,
        selection: &Selection,
        ticket: Option<RequestTicket>,
    ) -> Result<PipelineOutcome> {
        let resolved = self.resolve(selection)?;
        if let Some(stale) = ticket.filter(|_| self.is_stale(ticket)) {
            debug!("Request superseded before fetch");
            return Ok(PipelineOutcome::Superseded { ticket: stale });
        }

        let report = self.fetcher.fetch_selection(&resolved).await;
        if let Some(stale) = ticket.filter(|_| self.is_stale(ticket)) {
            info!(
                current = self.tracker.current_generation(),
                "Discarding results of superseded request"
            );
            return Ok(PipelineOutcome::Superseded { ticket: stale });
        }

        if report.all_failed() {
            if let Some(error) = report.into_first_failure() {
                return Err(error);
            }
            return Ok(PipelineOutcome::NoData {
                skipped: Vec::new(),
                failures: Vec::new(),
            });
        }

        let FetchReport { response, pairs } = report;
        let failures: Vec<PairReport> = pairs.into_iter().filter(|p| p.outcome.is_failed()).collect();

        Ok(match self.engine.normalize_selection(&response, &resolved) {
            NormalizeOutcome::Data(batch) => {
                info!(
                    components = batch.components.len(),
                    rows = batch.components.total_rows(),
                    warnings = batch.warnings.len(),
                    failed_pairs = failures.len(),
                    "Selection normalized"
                );
                PipelineOutcome::Ready(PipelineResult {
                    ticket,
                    batch,
                    failures,
                })
            }
            NormalizeOutcome::NoData { skipped } => {
                info!(skipped = skipped.len(), "Selection matched no rows");
                PipelineOutcome::NoData { skipped, failures }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_generations() {
        let tracker = RequestTracker::new();
        let first = tracker.begin();
        assert!(tracker.is_current(&first));

        let second = tracker.begin();
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
        assert!(second.generation() > first.generation());
        assert_eq!(tracker.current_generation(), 2);
    }
}
