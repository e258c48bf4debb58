// src/lib.rs
// Public library surface for integration tests (and embedding callers).

pub mod article;
pub mod category;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod retention;
pub mod source;
pub mod stats;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::article::{Article, RawArticle};
pub use crate::category::Category;
pub use crate::config::AggregatorConfig;
pub use crate::dedup::DedupEngine;
pub use crate::error::{AdapterError, ConfigurationError, IngestError, PersistenceError};
pub use crate::fetch::{FetchClient, FetchError, HttpFetchClient};
pub use crate::ingest::aggregator::{NewsAggregator, RunResult};
pub use crate::ingest::ledger::{RunLedger, RunRecord, RunStatus};
pub use crate::retention::RetentionSweeper;
pub use crate::source::{Source, SourceType};
pub use crate::stats::{StatsAggregator, StatsSnapshot};
pub use crate::store::memory::{MemoryArticleStore, MemorySourceStore};
pub use crate::store::{
    ArticleStore, CategoryResolver, Clock, ManualClock, SeedCategoryResolver, SourceStore,
    SystemClock,
};
