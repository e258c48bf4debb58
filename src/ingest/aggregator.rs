// src/ingest/aggregator.rs
// Drives one ingestion run per source: open a ledger entry, pre-flight the
// configuration, honor the source's cooperative rate limit, fetch through
// the matching adapter, then normalize → dedup → persist in fetch order.
// Every attempt ends with exactly one terminal ledger transition.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::article::Article;
use crate::config::AggregatorConfig;
use crate::dedup::DedupEngine;
use crate::error::{ConfigurationError, IngestError};
use crate::fetch::FetchClient;
use crate::ingest::adapters::{adapter_for, scrape};
use crate::ingest::ensure_metrics_described;
use crate::ingest::ledger::RunLedger;
use crate::retention::RetentionSweeper;
use crate::source::{Source, SourceType};
use crate::stats::{StatsAggregator, StatsSnapshot};
use crate::store::{ArticleStore, CategoryResolver, Clock, SourceStore};
use crate::error::PersistenceError;

/// Outcome of one run, as surfaced to callers and itemized in batch mode.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub source: String,
    pub success: bool,
    pub articles_found: u64,
    pub articles_new: u64,
    pub error: Option<String>,
}

impl RunResult {
    fn failure(run_id: Uuid, source: &str, found: u64, new: u64, error: String) -> Self {
        Self {
            run_id,
            source: source.to_string(),
            success: false,
            articles_found: found,
            articles_new: new,
            error: Some(error),
        }
    }
}

pub struct NewsAggregator {
    articles: Arc<dyn ArticleStore>,
    sources: Arc<dyn SourceStore>,
    categories: Arc<dyn CategoryResolver>,
    clock: Arc<dyn Clock>,
    fetch: Arc<dyn FetchClient>,
    dedup: DedupEngine,
    sweeper: RetentionSweeper,
    stats: StatsAggregator,
    ledger: RunLedger,
    cfg: AggregatorConfig,
    last_invocation: Mutex<HashMap<Uuid, Instant>>,
}

impl NewsAggregator {
    /// Explicit constructor injection; the core never performs ambient
    /// lookups of its collaborators.
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        sources: Arc<dyn SourceStore>,
        categories: Arc<dyn CategoryResolver>,
        clock: Arc<dyn Clock>,
        fetch: Arc<dyn FetchClient>,
        cfg: AggregatorConfig,
    ) -> Self {
        Self {
            dedup: DedupEngine::new(articles.clone()),
            sweeper: RetentionSweeper::new(articles.clone(), clock.clone()),
            stats: StatsAggregator::new(articles.clone(), sources.clone(), clock.clone()),
            articles,
            sources,
            categories,
            clock,
            fetch,
            ledger: RunLedger::default(),
            cfg,
            last_invocation: Mutex::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> &RunLedger {
        &self.ledger
    }

    /// One ingestion attempt for the given source.
    pub async fn run_source(&self, source_id: Uuid) -> RunResult {
        ensure_metrics_described();

        let source = match self.sources.find_by_id(source_id).await {
            Ok(Some(source)) => source,
            Ok(None) => {
                return RunResult::failure(
                    Uuid::nil(),
                    &source_id.to_string(),
                    0,
                    0,
                    format!("unknown source: {source_id}"),
                )
            }
            Err(e) => {
                return RunResult::failure(Uuid::nil(), &source_id.to_string(), 0, 0, e.to_string())
            }
        };

        let run_id = self.ledger.open(&source, self.clock.now());
        counter!("aggregator_runs_total").increment(1);

        if let Err(cfg_err) = self.preflight(&source) {
            return self.fail_run(run_id, &source, 0, 0, IngestError::from(cfg_err));
        }

        self.throttle(&source).await;

        // Fetch timing is sampled inside the adapter, next to the parse.
        let adapter = adapter_for(source.kind, self.fetch.clone(), self.clock.clone());
        let candidates = match adapter.fetch(&source).await {
            Ok(candidates) => candidates,
            Err(e) => return self.fail_run(run_id, &source, 0, 0, IngestError::from(e)),
        };

        let mut found = 0u64;
        let mut new = 0u64;
        for raw in candidates {
            found += 1;
            let category = self.categories.resolve(&raw.category_hint);
            let article = Article::from_raw(raw, &source, category, self.clock.now());

            // The store already holds this run's earlier saves, so a later
            // in-run duplicate dedups against the persisted copy.
            match self.dedup.is_duplicate(&article).await {
                Ok(true) => {
                    counter!("aggregator_duplicates_total").increment(1);
                    debug!(url = %article.url, "skipping duplicate candidate");
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    return self.fail_run(run_id, &source, found, new, IngestError::from(e))
                }
            }

            if let Err(e) = self.articles.save(article).await {
                // Partial writes stay committed; no cross-run rollback.
                return self.fail_run(run_id, &source, found, new, IngestError::from(e));
            }
            new += 1;
        }

        let finished_at = self.clock.now();
        if let Err(e) = self.ledger.complete(run_id, found, new, finished_at) {
            warn!(error = %e, run = %run_id, "could not close ledger entry");
        }
        if let Err(e) = self.sources.update_last_run(source.id, finished_at).await {
            warn!(error = %e, source = %source.name, "could not update last-run timestamp");
        }

        counter!("aggregator_articles_found_total").increment(found);
        counter!("aggregator_articles_new_total").increment(new);
        info!(
            target: "ingest",
            source = %source.name,
            found,
            new,
            "ingestion run completed"
        );

        RunResult {
            run_id,
            source: source.name.clone(),
            success: true,
            articles_found: found,
            articles_new: new,
            error: None,
        }
    }

    /// Run every active source, isolating failures: one source's error is
    /// itemized in its own result and never aborts the siblings.
    pub async fn run_all(&self) -> Vec<RunResult> {
        let active = match self.sources.find_active().await {
            Ok(active) => active,
            Err(e) => {
                warn!(error = %e, "could not enumerate active sources");
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(active.len());
        for source in active {
            results.push(self.run_source(source.id).await);
        }
        info!(
            target: "ingest",
            sources = results.len(),
            failed = results.iter().filter(|r| !r.success).count(),
            "batch ingestion finished"
        );
        results
    }

    /// Delete articles past the retention horizon; defaults to the
    /// configured retention window.
    pub async fn purge_expired(
        &self,
        retention_days: Option<u32>,
    ) -> Result<u64, PersistenceError> {
        self.sweeper
            .purge_expired(retention_days.unwrap_or(self.cfg.retention_days))
            .await
    }

    pub async fn statistics(&self) -> Result<StatsSnapshot, PersistenceError> {
        self.stats.snapshot().await
    }

    pub async fn search_count(&self, query: &str) -> Result<u64, PersistenceError> {
        self.stats.search_count(query).await
    }

    /// Configuration problems are caught before any network attempt.
    fn preflight(&self, source: &Source) -> Result<(), ConfigurationError> {
        if source.requires_api_key() && source.api_key.is_none() {
            return Err(ConfigurationError::MissingCredential(format!(
                "API source '{}' has no credential",
                source.name
            )));
        }
        if source.kind == SourceType::Scraping {
            scrape::validate_selectors(source)?;
        }
        Ok(())
    }

    /// Cooperative per-source delay, measured since this source's previous
    /// adapter invocation. Applied once per run, never per candidate.
    async fn throttle(&self, source: &Source) {
        let delay = source.rate_limit_delay();
        let wait = {
            let map = self
                .last_invocation
                .lock()
                .expect("rate limit mutex poisoned");
            map.get(&source.id)
                .and_then(|prev| delay.checked_sub(prev.elapsed()))
                .unwrap_or(Duration::ZERO)
        };
        if wait > Duration::ZERO {
            debug!(source = %source.name, wait_ms = wait.as_millis() as u64, "rate limit pause");
            tokio::time::sleep(wait).await;
        }
        self.last_invocation
            .lock()
            .expect("rate limit mutex poisoned")
            .insert(source.id, Instant::now());
    }

    fn fail_run(
        &self,
        run_id: Uuid,
        source: &Source,
        found: u64,
        new: u64,
        error: IngestError,
    ) -> RunResult {
        let message = error.to_string();
        if let Err(e) = self
            .ledger
            .fail(run_id, found, new, message.clone(), self.clock.now())
        {
            warn!(error = %e, run = %run_id, "could not close ledger entry");
        }
        counter!("aggregator_run_failures_total").increment(1);
        warn!(
            target: "ingest",
            source = %source.name,
            error = %message,
            "ingestion run failed"
        );
        RunResult::failure(run_id, &source.name, found, new, message)
    }
}
