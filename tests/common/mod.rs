// tests/common/mod.rs
// Shared test rig: a canned FetchClient and a fully wired aggregator over
// the in-memory stores with a manual clock.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use news_aggregator::{
    AggregatorConfig, FetchClient, FetchError, ManualClock, MemoryArticleStore, MemorySourceStore,
    NewsAggregator, SeedCategoryResolver,
};

#[allow(dead_code)]
#[derive(Clone)]
pub enum StubResponse {
    Body(String),
    Timeout(u64),
    Unreachable(String),
    Status(u16),
}

/// Routes URLs by prefix to canned responses and records every call.
pub struct StubFetchClient {
    routes: Vec<(String, StubResponse)>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl StubFetchClient {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, url_prefix: &str, response: StubResponse) -> Self {
        self.routes.push((url_prefix.to_string(), response));
        self
    }

    pub fn with_body(self, url_prefix: &str, body: &str) -> Self {
        self.with(url_prefix, StubResponse::Body(body.to_string()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchClient for StubFetchClient {
    async fn get_text(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self
            .routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
        {
            Some((_, StubResponse::Body(body))) => Ok(body.clone()),
            Some((_, StubResponse::Timeout(secs))) => Err(FetchError::Timeout(*secs)),
            Some((_, StubResponse::Unreachable(msg))) => Err(FetchError::Unreachable(msg.clone())),
            Some((_, StubResponse::Status(code))) => Err(FetchError::Status(*code)),
            None => Err(FetchError::Unreachable(format!("no stub for {url}"))),
        }
    }
}

#[allow(dead_code)]
pub struct Rig {
    pub aggregator: NewsAggregator,
    pub articles: Arc<MemoryArticleStore>,
    pub sources: Arc<MemorySourceStore>,
    pub clock: Arc<ManualClock>,
    pub fetch: Arc<StubFetchClient>,
}

#[allow(dead_code)]
pub fn rig(fetch: StubFetchClient) -> Rig {
    // Opt-in log output, e.g. RUST_LOG=ingest=debug cargo test.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let articles = Arc::new(MemoryArticleStore::new());
    let sources = Arc::new(MemorySourceStore::new());
    let clock = Arc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap(),
    ));
    let fetch = Arc::new(fetch);
    let aggregator = NewsAggregator::new(
        articles.clone(),
        sources.clone(),
        Arc::new(SeedCategoryResolver::new()),
        clock.clone(),
        fetch.clone(),
        AggregatorConfig::default(),
    );
    Rig {
        aggregator,
        articles,
        sources,
        clock,
        fetch,
    }
}
