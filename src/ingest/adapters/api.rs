// src/ingest/adapters/api.rs
// REST adapter: one authenticated GET against the configured endpoint,
// expecting a JSON array of items either bare or under an `articles`/`items`
// field. Page size is bounded through a `limit` query parameter.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;
use serde_json::Value;

use crate::article::RawArticle;
use crate::error::AdapterError;
use crate::fetch::FetchClient;
use crate::ingest::normalize_text;
use crate::source::{Source, SourceType};

use super::{sort_and_cap, SourceAdapter};

#[derive(Debug, Deserialize)]
struct ApiItem {
    #[serde(default)]
    title: String,
    #[serde(default, alias = "body", alias = "text")]
    content: String,
    #[serde(default, alias = "description")]
    summary: String,
    #[serde(default, alias = "link")]
    url: String,
    #[serde(default, alias = "image", alias = "urlToImage")]
    image_url: String,
    #[serde(default)]
    author: String,
    #[serde(default, alias = "publishedAt", alias = "published", alias = "date")]
    published_at: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    category: String,
}

pub struct ApiAdapter {
    fetch: Arc<dyn FetchClient>,
}

impl ApiAdapter {
    pub fn new(fetch: Arc<dyn FetchClient>) -> Self {
        Self { fetch }
    }

    fn request_url(source: &Source) -> Result<String, AdapterError> {
        let mut url = url::Url::parse(&source.url)
            .map_err(|e| AdapterError::Unreachable(format!("invalid endpoint URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in source.api_params() {
                pairs.append_pair(&name, &value);
            }
            pairs.append_pair("limit", &source.max_articles().to_string());
        }
        Ok(url.into())
    }

    fn parse_items(body: &str) -> Result<Vec<ApiItem>, AdapterError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| AdapterError::MalformedResponse(format!("invalid JSON: {e}")))?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => map
                .remove("articles")
                .or_else(|| map.remove("items"))
                .and_then(|v| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| {
                    AdapterError::MalformedResponse("no article array in response".into())
                })?,
            _ => {
                return Err(AdapterError::MalformedResponse(
                    "response is neither array nor object".into(),
                ))
            }
        };
        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| AdapterError::MalformedResponse(format!("bad item shape: {e}")))
            })
            .collect()
    }
}

/// Lenient timestamp parsing: RFC 3339 first, RFC 2822 second, then a bare
/// `YYYY-MM-DD HH:MM:SS`; anything else pins to the epoch.
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    DateTime::UNIX_EPOCH
}

#[async_trait]
impl SourceAdapter for ApiAdapter {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawArticle>, AdapterError> {
        let url = Self::request_url(source)?;
        let mut headers = Vec::new();
        if let Some(key) = &source.api_key {
            headers.push(("Authorization".to_string(), format!("Bearer {key}")));
        }

        let t0 = Instant::now();
        let body = self.fetch.get_text(&url, &headers).await?;
        let items = Self::parse_items(&body)?;

        let candidates: Vec<RawArticle> = items
            .into_iter()
            .map(|item| RawArticle {
                title: normalize_text(&item.title),
                content: normalize_text(&item.content),
                summary: normalize_text(&item.summary),
                url: item.url,
                image_url: item.image_url,
                author: item.author,
                published_at: parse_timestamp(&item.published_at),
                tags: item.tags,
                category_hint: item.category,
            })
            .filter(|c| !c.title.is_empty() || !c.url.is_empty())
            .collect();

        histogram!("adapter_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("adapter_items_total").increment(candidates.len() as u64);
        Ok(sort_and_cap(candidates, source.max_articles()))
    }

    fn kind(&self) -> SourceType {
        SourceType::Api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_arrays_and_wrapped_objects() {
        let bare = r#"[{"title": "A", "url": "https://e/a"}]"#;
        assert_eq!(ApiAdapter::parse_items(bare).unwrap().len(), 1);

        let wrapped = r#"{"status": "ok", "articles": [{"title": "A"}, {"title": "B"}]}"#;
        assert_eq!(ApiAdapter::parse_items(wrapped).unwrap().len(), 2);
    }

    #[test]
    fn rejects_non_array_payloads() {
        assert!(matches!(
            ApiAdapter::parse_items(r#"{"status": "ok"}"#),
            Err(AdapterError::MalformedResponse(_))
        ));
        assert!(matches!(
            ApiAdapter::parse_items("not json"),
            Err(AdapterError::MalformedResponse(_))
        ));
    }

    #[test]
    fn timestamp_parsing_is_lenient() {
        assert_ne!(parse_timestamp("2026-08-01T10:00:00Z"), DateTime::UNIX_EPOCH);
        assert_ne!(
            parse_timestamp("Tue, 04 Aug 2026 09:00:00 GMT"),
            DateTime::UNIX_EPOCH
        );
        assert_ne!(parse_timestamp("2026-08-01 10:00:00"), DateTime::UNIX_EPOCH);
        assert_eq!(parse_timestamp("next tuesday"), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn request_url_carries_params_and_limit() {
        let source = Source::new("NewsAPI", "https://api.example/v2/top", SourceType::Api, "")
            .with_config(
                serde_json::json!({"api_params": {"country": "us"}, "max_articles": 5})
                    .as_object()
                    .cloned()
                    .unwrap(),
            );
        let url = ApiAdapter::request_url(&source).unwrap();
        assert!(url.contains("country=us"));
        assert!(url.contains("limit=5"));
    }
}
