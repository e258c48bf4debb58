// src/dedup.rs
// Content fingerprinting and the duplicate decision. A candidate duplicates
// an existing article when fingerprints match, canonical URLs match, or the
// title similarity ratio exceeds SIMILARITY_THRESHOLD. The similarity check
// is deliberately case-sensitive (carried behavior, see DESIGN.md).

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::article::Article;
use crate::error::PersistenceError;
use crate::store::ArticleStore;

pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Similarity scanning is bounded to the newest slice of the candidate's
/// category; fingerprint and URL checks stay corpus-wide via indexed lookups.
pub const SIMILARITY_SCAN_LIMIT: usize = 200;

/// Deterministic digest over title + content, lowercase hex.
pub fn fingerprint(title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(content.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Count of matching characters between two strings: the longest common
/// substring, then recursion on the unmatched prefixes and suffixes.
pub fn similar_text(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    matching_chars(&a, &b)
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (mut pos_a, mut pos_b, mut max) = (0usize, 0usize, 0usize);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut k = 0;
            while i + k < a.len() && j + k < b.len() && a[i + k] == b[j + k] {
                k += 1;
            }
            if k > max {
                max = k;
                pos_a = i;
                pos_b = j;
            }
        }
    }
    if max == 0 {
        return 0;
    }
    max + matching_chars(&a[..pos_a], &b[..pos_b])
        + matching_chars(&a[pos_a + max..], &b[pos_b + max..])
}

/// Matching characters divided by the candidate title's length.
/// Returns 0.0 when either title is empty so the ratio never divides by zero.
pub fn similarity_ratio(candidate_title: &str, existing_title: &str) -> f64 {
    let len = candidate_title.chars().count();
    if len == 0 || existing_title.is_empty() {
        return 0.0;
    }
    similar_text(candidate_title, existing_title) as f64 / len as f64
}

/// Decides duplicate status for normalized candidates against the corpus.
pub struct DedupEngine {
    articles: Arc<dyn ArticleStore>,
}

impl DedupEngine {
    pub fn new(articles: Arc<dyn ArticleStore>) -> Self {
        Self { articles }
    }

    /// True when any duplicate of `candidate` already exists. Cheap indexed
    /// checks short-circuit before the bounded similarity scan.
    pub async fn is_duplicate(&self, candidate: &Article) -> Result<bool, PersistenceError> {
        if self
            .articles
            .find_by_fingerprint(candidate.fingerprint())
            .await?
            .is_some()
        {
            return Ok(true);
        }
        if self.articles.find_by_url(&candidate.url).await?.is_some() {
            return Ok(true);
        }
        Ok(self.similar_existing(candidate).await?.into_iter().next().is_some())
    }

    /// All stored articles the candidate duplicates, possibly empty.
    pub async fn find_duplicates(
        &self,
        candidate: &Article,
    ) -> Result<Vec<Article>, PersistenceError> {
        let mut out: Vec<Article> = Vec::new();
        if let Some(hit) = self
            .articles
            .find_by_fingerprint(candidate.fingerprint())
            .await?
        {
            out.push(hit);
        }
        if let Some(hit) = self.articles.find_by_url(&candidate.url).await? {
            if !out.iter().any(|a| a.id == hit.id) {
                out.push(hit);
            }
        }
        for hit in self.similar_existing(candidate).await? {
            if !out.iter().any(|a| a.id == hit.id) {
                out.push(hit);
            }
        }
        Ok(out)
    }

    async fn similar_existing(
        &self,
        candidate: &Article,
    ) -> Result<Vec<Article>, PersistenceError> {
        if candidate.title.is_empty() {
            return Ok(Vec::new());
        }
        let pool = self
            .articles
            .find_by_category(candidate.category.slug(), SIMILARITY_SCAN_LIMIT, 0)
            .await?;
        Ok(pool
            .into_iter()
            .filter(|existing| {
                existing.id != candidate.id
                    && !existing.title.is_empty()
                    && similarity_ratio(&candidate.title, &existing.title) > SIMILARITY_THRESHOLD
            })
            .collect())
    }
}
