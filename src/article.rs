// src/article.rs
// Canonical article representation plus the raw candidate shape adapters
// emit. The fingerprint is derived from title + content and is recomputed by
// every constructor that touches either field — including deserialization,
// which ignores any serialized fingerprint; it cannot be set directly.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::category::Category;
use crate::dedup::{self, SIMILARITY_THRESHOLD};
use crate::source::Source;

/// A candidate article as pulled from one source, before normalization into
/// a full [`Article`]. Optional upstream fields arrive as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub url: String,
    pub image_url: String,
    pub author: String,
    #[serde(default = "epoch")]
    pub published_at: DateTime<Utc>,
    pub tags: Vec<String>,
    /// Free-text category hint for the resolver; may be empty.
    pub category_hint: String,
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Default for RawArticle {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            summary: String::new(),
            url: String::new(),
            image_url: String::new(),
            author: String::new(),
            published_at: epoch(),
            tags: Vec::new(),
            category_hint: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub url: String,
    pub image_url: String,
    pub author: String,
    pub source_id: Uuid,
    pub source_name: String,
    pub category: Category,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    fingerprint: String,
}

impl<'de> Deserialize<'de> for Article {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            id: Uuid,
            title: String,
            content: String,
            #[serde(default)]
            summary: String,
            url: String,
            #[serde(default)]
            image_url: String,
            #[serde(default)]
            author: String,
            source_id: Uuid,
            source_name: String,
            category: Category,
            published_at: DateTime<Utc>,
            created_at: DateTime<Utc>,
            #[serde(default)]
            tags: BTreeSet<String>,
        }
        let wire = Wire::deserialize(deserializer)?;
        let fingerprint = dedup::fingerprint(&wire.title, &wire.content);
        Ok(Article {
            id: wire.id,
            title: wire.title,
            content: wire.content,
            summary: wire.summary,
            url: wire.url,
            image_url: wire.image_url,
            author: wire.author,
            source_id: wire.source_id,
            source_name: wire.source_name,
            category: wire.category,
            published_at: wire.published_at,
            created_at: wire.created_at,
            tags: wire.tags,
            fingerprint,
        })
    }
}

impl Article {
    /// Promote an adapter candidate into a stored article: assign an id,
    /// attach the resolved category, and compute the fingerprint.
    pub fn from_raw(
        raw: RawArticle,
        source: &Source,
        category: Category,
        created_at: DateTime<Utc>,
    ) -> Self {
        let fingerprint = dedup::fingerprint(&raw.title, &raw.content);
        Self {
            id: Uuid::new_v4(),
            title: raw.title,
            content: raw.content,
            summary: raw.summary,
            url: raw.url,
            image_url: raw.image_url,
            author: raw.author,
            source_id: source.id,
            source_name: source.name.clone(),
            category,
            published_at: raw.published_at,
            created_at,
            tags: raw.tags.into_iter().collect(),
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Replace body and summary, recomputing the fingerprint. Everything
    /// else, including id and created_at, is preserved.
    pub fn with_updated_content(mut self, content: &str, summary: &str) -> Self {
        self.content = content.to_string();
        self.summary = summary.to_string();
        self.fingerprint = dedup::fingerprint(&self.title, &self.content);
        self
    }

    pub fn is_from_source(&self, source_name: &str) -> bool {
        self.source_name == source_name
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Pairwise duplicate predicate: fingerprint match, URL match, or title
    /// similarity above the threshold. The similarity clause is skipped when
    /// either title is empty.
    pub fn duplicates(&self, other: &Article) -> bool {
        self.fingerprint == other.fingerprint
            || self.url == other.url
            || dedup::similarity_ratio(&self.title, &other.title) > SIMILARITY_THRESHOLD
    }
}
