// src/stats.rs
// Read-only aggregate counts for observability. Always reflects store state
// at the moment of invocation; any caching belongs to an outer collaborator.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::category::Category;
use crate::error::PersistenceError;
use crate::store::{ArticleStore, Clock, SourceStore};

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_articles: u64,
    /// Per-category counts keyed by slug; every seed category is present,
    /// zeros included.
    pub by_category: BTreeMap<String, u64>,
    /// Per-source counts keyed by source name.
    pub by_source: BTreeMap<String, u64>,
    pub total_sources: u64,
    pub active_sources: u64,
    pub taken_at: DateTime<Utc>,
}

pub struct StatsAggregator {
    articles: Arc<dyn ArticleStore>,
    sources: Arc<dyn SourceStore>,
    clock: Arc<dyn Clock>,
}

impl StatsAggregator {
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        sources: Arc<dyn SourceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            articles,
            sources,
            clock,
        }
    }

    pub async fn snapshot(&self) -> Result<StatsSnapshot, PersistenceError> {
        let mut by_category = BTreeMap::new();
        for category in Category::seed() {
            let count = self.articles.count_by_category(category.slug()).await?;
            by_category.insert(category.slug().to_string(), count);
        }

        let mut by_source = BTreeMap::new();
        for source in self.sources.find_all().await? {
            let count = self.articles.count_by_source(&source.name).await?;
            by_source.insert(source.name, count);
        }

        Ok(StatsSnapshot {
            total_articles: self.articles.count_total().await?,
            by_category,
            by_source,
            total_sources: self.sources.count().await?,
            active_sources: self.sources.count_active().await?,
            taken_at: self.clock.now(),
        })
    }

    /// Articles matching a free-text predicate over title/content/summary.
    pub async fn search_count(&self, query: &str) -> Result<u64, PersistenceError> {
        self.articles.count_search(query).await
    }
}
