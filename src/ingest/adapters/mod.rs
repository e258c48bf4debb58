// src/ingest/adapters/mod.rs
pub mod api;
pub mod rss;
pub mod scrape;

use std::sync::Arc;

use async_trait::async_trait;

use crate::article::RawArticle;
use crate::error::AdapterError;
use crate::fetch::FetchClient;
use crate::source::{Source, SourceType};
use crate::store::Clock;

/// Pulls raw candidates from one source mechanism. Adapters never touch
/// deduplication or persistence; they return normalized candidates capped
/// at the source's max-articles knob.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawArticle>, AdapterError>;
    fn kind(&self) -> SourceType;
}

/// Closed dispatch over the source type; one adapter per variant.
pub fn adapter_for(
    kind: SourceType,
    fetch: Arc<dyn FetchClient>,
    clock: Arc<dyn Clock>,
) -> Box<dyn SourceAdapter> {
    match kind {
        SourceType::Api => Box::new(api::ApiAdapter::new(fetch)),
        SourceType::Rss => Box::new(rss::RssAdapter::new(fetch)),
        SourceType::Scraping => Box::new(scrape::ScrapeAdapter::new(fetch, clock)),
    }
}

/// Order by published timestamp descending, then cut at the cap. The cap is
/// applied here, before counting, so `articles_found` reflects capped output.
pub(crate) fn sort_and_cap(mut candidates: Vec<RawArticle>, cap: usize) -> Vec<RawArticle> {
    candidates.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    candidates.truncate(cap);
    candidates
}
