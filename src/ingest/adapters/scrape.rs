// src/ingest/adapters/scrape.rs
// Scraping adapter: extracts candidates from an HTML page using the
// source's CSS selector map. `container`, `title` and `content` are
// required; `summary`, `image`, `author` and `url` are optional. Relative
// hrefs and srcs are resolved against the page URL; stories without a
// per-story link get a distinct fragment of the page URL so they stay
// distinguishable to the URL-based dedup. Scraped pages carry no
// publication date, so candidates are stamped with the injected clock.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use scraper::{ElementRef, Html, Selector};

use crate::article::RawArticle;
use crate::error::{AdapterError, ConfigurationError};
use crate::fetch::FetchClient;
use crate::ingest::normalize_text;
use crate::source::{Source, SourceType};
use crate::store::Clock;

use super::{sort_and_cap, SourceAdapter};

pub(crate) const REQUIRED_SELECTORS: [&str; 3] = ["container", "title", "content"];

/// Pre-flight check run by the orchestrator before any network attempt:
/// required keys present and every selector string parsable.
pub fn validate_selectors(source: &Source) -> Result<(), ConfigurationError> {
    let selectors = source.selectors();
    for key in REQUIRED_SELECTORS {
        if !selectors.contains_key(key) {
            return Err(ConfigurationError::InvalidSelector(format!(
                "scraping source '{}' has no '{key}' selector",
                source.name
            )));
        }
    }
    for (key, value) in &selectors {
        if Selector::parse(value).is_err() {
            return Err(ConfigurationError::InvalidSelector(format!(
                "selector '{key}' does not parse: {value}"
            )));
        }
    }
    Ok(())
}

pub struct ScrapeAdapter {
    fetch: Arc<dyn FetchClient>,
    clock: Arc<dyn Clock>,
}

impl ScrapeAdapter {
    pub fn new(fetch: Arc<dyn FetchClient>, clock: Arc<dyn Clock>) -> Self {
        Self { fetch, clock }
    }

    fn selector(
        selectors: &BTreeMap<String, String>,
        key: &str,
    ) -> Result<Option<Selector>, AdapterError> {
        match selectors.get(key) {
            None => Ok(None),
            Some(raw) => Selector::parse(raw)
                .map(Some)
                .map_err(|_| AdapterError::SelectorMismatch(format!("unparsable selector '{raw}'"))),
        }
    }

    fn required(
        selectors: &BTreeMap<String, String>,
        key: &str,
    ) -> Result<Selector, AdapterError> {
        Self::selector(selectors, key)?.ok_or_else(|| {
            AdapterError::SelectorMismatch(format!("no '{key}' selector configured"))
        })
    }
}

fn text_of(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
}

fn attr_of(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr).map(str::to_string))
}

fn resolve(base: Option<&url::Url>, href: &str) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

#[async_trait]
impl SourceAdapter for ScrapeAdapter {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawArticle>, AdapterError> {
        let selectors = source.selectors();
        let container_sel = Self::required(&selectors, "container")?;
        let title_sel = Self::required(&selectors, "title")?;
        let content_sel = Self::required(&selectors, "content")?;
        let summary_sel = Self::selector(&selectors, "summary")?;
        let image_sel = Self::selector(&selectors, "image")?;
        let author_sel = Self::selector(&selectors, "author")?;
        let url_sel = Self::selector(&selectors, "url")?;

        let t0 = Instant::now();
        let body = self.fetch.get_text(&source.url, &[]).await?;
        let base = url::Url::parse(&source.url).ok();
        let now = self.clock.now();

        // Html is not Send; parse and extract before the next await point.
        let mut candidates = Vec::new();
        {
            let document = Html::parse_document(&body);
            let containers: Vec<ElementRef<'_>> = document.select(&container_sel).collect();
            if containers.is_empty() {
                return Err(AdapterError::SelectorMismatch(
                    "container selector matched nothing".into(),
                ));
            }

            for (index, container) in containers.into_iter().enumerate() {
                let title = text_of(container, &title_sel).ok_or_else(|| {
                    AdapterError::SelectorMismatch("title selector matched nothing".into())
                })?;
                let content = text_of(container, &content_sel).ok_or_else(|| {
                    AdapterError::SelectorMismatch("content selector matched nothing".into())
                })?;
                let url = url_sel
                    .as_ref()
                    .and_then(|sel| attr_of(container, sel, "href"))
                    .map(|href| resolve(base.as_ref(), &href))
                    .unwrap_or_else(|| format!("{}#story-{}", source.url, index + 1));
                let image_url = image_sel
                    .as_ref()
                    .and_then(|sel| attr_of(container, sel, "src"))
                    .map(|src| resolve(base.as_ref(), &src))
                    .unwrap_or_default();

                candidates.push(RawArticle {
                    title: normalize_text(&title),
                    content: normalize_text(&content),
                    summary: summary_sel
                        .as_ref()
                        .and_then(|sel| text_of(container, sel))
                        .map(|s| normalize_text(&s))
                        .unwrap_or_default(),
                    url,
                    image_url,
                    author: author_sel
                        .as_ref()
                        .and_then(|sel| text_of(container, sel))
                        .map(|s| normalize_text(&s))
                        .unwrap_or_default(),
                    published_at: now,
                    tags: Vec::new(),
                    category_hint: String::new(),
                });
            }
        }

        histogram!("adapter_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("adapter_items_total").increment(candidates.len() as u64);
        Ok(sort_and_cap(candidates, source.max_articles()))
    }

    fn kind(&self) -> SourceType {
        SourceType::Scraping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scraping_source(selectors: serde_json::Value) -> Source {
        Source::new("Site", "https://site.example/news", SourceType::Scraping, "").with_config(
            json!({ "selectors": selectors })
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    #[test]
    fn validate_requires_container_title_content() {
        let incomplete = scraping_source(json!({"container": ".story", "title": "h2"}));
        assert!(matches!(
            validate_selectors(&incomplete),
            Err(ConfigurationError::InvalidSelector(_))
        ));

        let complete = scraping_source(json!({
            "container": ".story", "title": "h2", "content": ".body"
        }));
        assert!(validate_selectors(&complete).is_ok());
    }

    #[test]
    fn validate_rejects_unparsable_selector_strings() {
        let broken = scraping_source(json!({
            "container": ".story", "title": "h2", "content": ":::nope"
        }));
        assert!(matches!(
            validate_selectors(&broken),
            Err(ConfigurationError::InvalidSelector(_))
        ));
    }

    #[test]
    fn relative_urls_resolve_against_the_page() {
        let base = url::Url::parse("https://site.example/news").unwrap();
        assert_eq!(
            resolve(Some(&base), "/2026/story"),
            "https://site.example/2026/story"
        );
        assert_eq!(
            resolve(Some(&base), "https://cdn.example/pic.jpg"),
            "https://cdn.example/pic.jpg"
        );
    }
}
