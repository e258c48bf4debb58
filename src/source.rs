// src/source.rs
// Immutable descriptor of one external news source plus its per-source
// tuning knobs. Knobs live in a free-form JSON map so operators can add
// selectors or API parameters without schema changes; accessors apply the
// documented defaults. Updates are pure copies, never in-place mutation.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const DEFAULT_RATE_LIMIT_SECS: u64 = 2;
pub const DEFAULT_MAX_ARTICLES: usize = 50;

/// Closed set of supported source mechanisms; adapter dispatch matches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Api,
    Rss,
    Scraping,
}

impl SourceType {
    pub fn describe(&self) -> &'static str {
        match self {
            SourceType::Api => "REST API with JSON responses",
            SourceType::Rss => "RSS/Atom feed",
            SourceType::Scraping => "Web scraping with selectors",
        }
    }

    /// API and scraping sources need a configuration map (parameters,
    /// selectors) before a run can be attempted; plain feeds do not.
    pub fn requires_configuration(&self) -> bool {
        matches!(self, SourceType::Api | SourceType::Scraping)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub kind: SourceType,
    pub description: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    pub active: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

impl Source {
    pub fn new(name: &str, url: &str, kind: SourceType, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            url: url.to_string(),
            kind,
            description: description.to_string(),
            config: Map::new(),
            active: true,
            api_key: None,
            created_at: Utc::now(),
            last_run_at: None,
        }
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    /// CSS selector map for scraping sources, from `config.selectors`.
    pub fn selectors(&self) -> BTreeMap<String, String> {
        self.config
            .get("selectors")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cooperative delay between adapter invocations for this source.
    pub fn rate_limit_delay(&self) -> Duration {
        let secs = self
            .config
            .get("rate_limit_delay")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_RATE_LIMIT_SECS);
        Duration::from_secs(secs)
    }

    /// Per-run candidate cap, applied after ordering by published time.
    pub fn max_articles(&self) -> usize {
        self.config
            .get("max_articles")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_ARTICLES)
    }

    /// Extra query parameters for API sources, from `config.api_params`.
    pub fn api_params(&self) -> Vec<(String, String)> {
        self.config
            .get("api_params")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .map(|(k, v)| {
                        let v = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (k.clone(), v)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Only API sources authenticate; the orchestrator refuses to contact
    /// the network for an API source with no key.
    pub fn requires_api_key(&self) -> bool {
        self.kind == SourceType::Api
    }

    pub fn with_last_run_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.last_run_at = Some(timestamp);
        self
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}
