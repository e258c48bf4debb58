// src/store/mod.rs
// Collaborator interfaces the ingestion core is built against. Persistence,
// category resolution, and the clock are injected; the core never reaches
// for ambient globals.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::article::Article;
use crate::category::Category;
use crate::error::PersistenceError;
use crate::source::{Source, SourceType};

/// Article persistence. `find_by_fingerprint` and `find_by_url` must be
/// index-backed lookups; they are on the hot path of every dedup decision.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn save(&self, article: Article) -> Result<(), PersistenceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, PersistenceError>;
    async fn find_by_fingerprint(&self, fingerprint: &str)
        -> Result<Option<Article>, PersistenceError>;
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, PersistenceError>;

    /// Newest first by published timestamp.
    async fn find_latest(&self, limit: usize, offset: usize)
        -> Result<Vec<Article>, PersistenceError>;
    async fn find_by_category(
        &self,
        slug: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Article>, PersistenceError>;
    async fn find_by_source(
        &self,
        source_name: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Article>, PersistenceError>;
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Article>, PersistenceError>;

    async fn count_total(&self) -> Result<u64, PersistenceError>;
    async fn count_by_category(&self, slug: &str) -> Result<u64, PersistenceError>;
    async fn count_by_source(&self, source_name: &str) -> Result<u64, PersistenceError>;
    async fn count_search(&self, query: &str) -> Result<u64, PersistenceError>;

    async fn delete(&self, id: Uuid) -> Result<(), PersistenceError>;

    /// Delete articles published strictly before `cutoff`; returns how many.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError>;
}

#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn save(&self, source: Source) -> Result<(), PersistenceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Source>, PersistenceError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Source>, PersistenceError>;
    async fn find_all(&self) -> Result<Vec<Source>, PersistenceError>;
    async fn find_active(&self) -> Result<Vec<Source>, PersistenceError>;
    async fn find_by_kind(&self, kind: SourceType) -> Result<Vec<Source>, PersistenceError>;

    /// Set by the orchestrator only, after a run reaches Completed.
    async fn update_last_run(
        &self,
        id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<(), PersistenceError>;

    async fn count(&self) -> Result<u64, PersistenceError>;
    async fn count_active(&self) -> Result<u64, PersistenceError>;
    async fn delete(&self, id: Uuid) -> Result<(), PersistenceError>;
}

/// Maps a free-text hint from an adapter to a canonical category.
pub trait CategoryResolver: Send + Sync {
    fn resolve(&self, hint: &str) -> Category;
}

/// Keyword resolver over the seed taxonomy; unknown hints land in General.
pub struct SeedCategoryResolver {
    categories: Vec<Category>,
}

impl SeedCategoryResolver {
    pub fn new() -> Self {
        Self {
            categories: Category::seed(),
        }
    }
}

impl Default for SeedCategoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryResolver for SeedCategoryResolver {
    fn resolve(&self, hint: &str) -> Category {
        let hint = hint.trim();
        if hint.is_empty() {
            return Category::general();
        }
        self.categories
            .iter()
            .find(|c| c.matches(hint))
            .cloned()
            .unwrap_or_else(Category::general)
    }
}

/// Injected time source so runs and tests agree on "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replay tooling.
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}
