//! Per-pair query execution.
//!
//! One query runs per requested (category, year) pair. Pairs run concurrently
//! up to a configured bound, but results are buffered back into request
//! order; a slow first pair never lets a fast second pair overtake it. A
//! failing pair is reported on its own and never affects the others.

use crate::error::{ComponetError, Result};
use crate::log_data_op;
use crate::logging::LogConfig;
use crate::metadata::AttributeMetadata;
use crate::query::QueryBuilder;
use crate::rows::{RawResponse, RawRow};
use crate::selection::{ResolvedPair, ResolvedSelection};
use crate::sources::RowSource;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Default bound on concurrently executing queries.
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 20;

/// What happened to one pair.
#[derive(Debug)]
pub enum PairOutcome {
    /// The query returned this many rows.
    Rows(usize),
    /// The query succeeded but matched nothing.
    Empty,
    /// The query failed; other pairs are unaffected.
    Failed(ComponetError),
}

impl PairOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PairOutcome::Failed(_))
    }
}

/// Outcome for one requested pair.
#[derive(Debug)]
pub struct PairReport {
    /// Category storage key
    pub category: String,
    pub year: String,
    pub outcome: PairOutcome,
}

/// Everything one fetch produced.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Rows keyed by category, in request order, each tagged with its year
    pub response: RawResponse,
    /// One report per requested pair, in request order
    pub pairs: Vec<PairReport>,
}

impl FetchReport {
    /// Reports of pairs whose query failed.
    pub fn failures(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|p| p.outcome.is_failed())
    }

    /// Whether every requested pair failed. `false` for an empty request.
    pub fn all_failed(&self) -> bool {
        !self.pairs.is_empty() && self.pairs.iter().all(|p| p.outcome.is_failed())
    }

    /// First failure, consuming the report.
    pub fn into_first_failure(self) -> Option<ComponetError> {
        self.pairs.into_iter().find_map(|p| match p.outcome {
            PairOutcome::Failed(e) => Some(e),
            _ => None,
        })
    }
}

/// Executes catalog queries against a [`RowSource`].
#[derive(Debug, Clone)]
pub struct ResultFetcher {
    source: Arc<dyn RowSource>,
    builder: QueryBuilder,
    max_concurrent_queries: usize,
    log: LogConfig,
}

impl ResultFetcher {
    pub fn new(source: Arc<dyn RowSource>, builder: QueryBuilder) -> Self {
        Self {
            source,
            builder,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            log: LogConfig::default(),
        }
    }

    /// Sets the concurrency bound; values below one are treated as one.
    pub fn with_max_concurrent_queries(mut self, limit: usize) -> Self {
        self.max_concurrent_queries = limit.max(1);
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn max_concurrent_queries(&self) -> usize {
        self.max_concurrent_queries
    }

    pub fn source(&self) -> &Arc<dyn RowSource> {
        &self.source
    }

    /// Fetches every pair of a resolved selection.
    pub async fn fetch_selection(&self, selection: &ResolvedSelection) -> FetchReport {
        self.fetch(&selection.pairs, &selection.attributes).await
    }

    /// Runs one query per pair and merges the rows in request order.
    #[instrument(skip_all, fields(pairs = pairs.len(), attributes = attributes.len(), source = %self.source.description()))]
    pub async fn fetch(&self, pairs: &[ResolvedPair], attributes: &[AttributeMetadata]) -> FetchReport {
        let results: Vec<Result<Vec<RawRow>>> = stream::iter(
            pairs.iter().map(|pair| self.fetch_pair(pair, attributes)),
        )
        .buffered(self.max_concurrent_queries)
        .collect()
        .await;

        let mut report = FetchReport::default();
        for (pair, result) in pairs.iter().zip(results) {
            let outcome = match result {
                Ok(rows) if rows.is_empty() => {
                    report.response.extend(pair.category_key(), Vec::new());
                    PairOutcome::Empty
                }
                Ok(rows) => {
                    let count = rows.len();
                    report.response.extend(pair.category_key(), rows);
                    PairOutcome::Rows(count)
                }
                Err(e) => {
                    warn!(
                        category = %pair.category_key(),
                        year = %pair.year,
                        error = %e,
                        "Catalog query failed"
                    );
                    PairOutcome::Failed(e)
                }
            };
            report.pairs.push(PairReport {
                category: pair.category_key().to_string(),
                year: pair.year.clone(),
                outcome,
            });
        }

        info!(
            rows = report.response.total_rows(),
            failed = report.failures().count(),
            "Fetched catalog rows"
        );
        report
    }

    async fn fetch_pair(
        &self,
        pair: &ResolvedPair,
        attributes: &[AttributeMetadata],
    ) -> Result<Vec<RawRow>> {
        let catalog = self.builder.catalog();
        let year_filter = catalog.filter_by_year.then_some(pair.year.as_str());
        let sql = self
            .builder
            .build_resolved(&pair.category, year_filter, attributes)?;

        let mut rows = self.source.query(&sql).await.map_err(|e| {
            ComponetError::fetch_with_source(
                pair.category_key(),
                pair.year.as_str(),
                e.to_string(),
                Box::new(e),
            )
        })?;

        for row in &mut rows {
            row.insert(catalog.year_column.as_str(), Some(pair.year.clone()));
        }

        log_data_op!(
            self.log,
            category = %pair.category_key(),
            year = %pair.year,
            rows = rows.len(),
            "Fetched pair"
        );
        Ok(rows)
    }
}
