// src/ingest/adapters/rss.rs
// Feed adapter: RSS 2.0 first, Atom as fallback. Optional fields (image,
// author, summary) degrade to empty strings; items with neither title nor
// link are dropped. Dates are RFC 2822 for RSS pubDate and RFC 3339 for
// Atom; unparsable dates pin to the epoch.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::article::RawArticle;
use crate::error::AdapterError;
use crate::fetch::FetchClient;
use crate::ingest::normalize_text;
use crate::source::{Source, SourceType};

use super::{sort_and_cap, SourceAdapter};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<String>,
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    author: Option<AtomAuthor>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

fn parse_rfc2822(ts: &str) -> DateTime<Utc> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn parse_rfc3339(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

pub struct RssAdapter {
    fetch: Arc<dyn FetchClient>,
}

impl RssAdapter {
    pub fn new(fetch: Arc<dyn FetchClient>) -> Self {
        Self { fetch }
    }

    pub(crate) fn parse_feed(body: &str) -> Result<Vec<RawArticle>, AdapterError> {
        let xml = scrub_html_entities_for_xml(body);
        if let Ok(rss) = from_str::<Rss>(&xml) {
            return Ok(rss.channel.items.into_iter().filter_map(rss_item).collect());
        }
        // An Atom document always has a <feed> root; without the guard any
        // well-formed XML would "parse" as an Atom feed with zero entries.
        if xml.contains("<feed") {
            return match from_str::<AtomFeed>(&xml) {
                Ok(feed) => Ok(feed.entries.into_iter().filter_map(atom_entry).collect()),
                Err(e) => Err(AdapterError::MalformedFeed(format!("bad Atom feed: {e}"))),
            };
        }
        Err(AdapterError::MalformedFeed(
            "document is neither RSS nor Atom".into(),
        ))
    }
}

fn rss_item(item: Item) -> Option<RawArticle> {
    if item.title.is_none() && item.link.is_none() {
        return None;
    }
    let description = normalize_text(item.description.as_deref().unwrap_or_default());
    // The first feed-declared category doubles as the resolver hint; all of
    // them stay on the article as tags.
    let category_hint = item.categories.first().cloned().unwrap_or_default();
    Some(RawArticle {
        title: normalize_text(item.title.as_deref().unwrap_or_default()),
        content: description.clone(),
        summary: description,
        url: item.link.unwrap_or_default(),
        image_url: item.enclosure.and_then(|e| e.url).unwrap_or_default(),
        author: item.author.unwrap_or_default(),
        published_at: item
            .pub_date
            .as_deref()
            .map(parse_rfc2822)
            .unwrap_or(DateTime::UNIX_EPOCH),
        tags: item.categories,
        category_hint,
    })
}

fn atom_entry(entry: AtomEntry) -> Option<RawArticle> {
    let url = entry.links.into_iter().find_map(|l| l.href);
    if entry.title.is_none() && url.is_none() {
        return None;
    }
    let summary = normalize_text(entry.summary.as_deref().unwrap_or_default());
    let content = match entry.content.as_deref() {
        Some(c) => normalize_text(c),
        None => summary.clone(),
    };
    Some(RawArticle {
        title: normalize_text(entry.title.as_deref().unwrap_or_default()),
        content,
        summary,
        url: url.unwrap_or_default(),
        image_url: String::new(),
        author: entry.author.and_then(|a| a.name).unwrap_or_default(),
        published_at: entry
            .published
            .or(entry.updated)
            .as_deref()
            .map(parse_rfc3339)
            .unwrap_or(DateTime::UNIX_EPOCH),
        tags: Vec::new(),
        category_hint: String::new(),
    })
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawArticle>, AdapterError> {
        let t0 = Instant::now();
        let body = self.fetch.get_text(&source.url, &[]).await?;
        let candidates = Self::parse_feed(&body)?;

        histogram!("adapter_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("adapter_items_total").increment(candidates.len() as u64);
        Ok(sort_and_cap(candidates, source.max_articles()))
    }

    fn kind(&self) -> SourceType {
        SourceType::Rss
    }
}
