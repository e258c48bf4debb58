// src/store/memory.rs
// Mutex-guarded in-memory store implementations. These back the test suite
// and small embeddings; the fingerprint/URL indexes give the O(1) lookups
// the dedup engine requires, and unique constraints on both act as the
// correctness backstop if a logical dedup check ever races an insert.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::article::Article;
use crate::error::PersistenceError;
use crate::source::{Source, SourceType};
use crate::store::{ArticleStore, SourceStore};

#[derive(Default)]
struct ArticleShelf {
    by_id: HashMap<Uuid, Article>,
    id_by_fingerprint: HashMap<String, Uuid>,
    id_by_url: HashMap<String, Uuid>,
}

impl ArticleShelf {
    fn unindex(&mut self, article: &Article) {
        self.id_by_fingerprint.remove(article.fingerprint());
        self.id_by_url.remove(&article.url);
    }
}

pub struct MemoryArticleStore {
    inner: Mutex<ArticleShelf>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ArticleShelf::default()),
        }
    }

    fn sorted_filtered<F>(&self, predicate: F, limit: usize, offset: usize) -> Vec<Article>
    where
        F: Fn(&Article) -> bool,
    {
        let shelf = self.inner.lock().expect("article store mutex poisoned");
        let mut hits: Vec<Article> = shelf.by_id.values().filter(|a| predicate(a)).cloned().collect();
        hits.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        hits.into_iter().skip(offset).take(limit).collect()
    }

    fn count_where<F>(&self, predicate: F) -> u64
    where
        F: Fn(&Article) -> bool,
    {
        let shelf = self.inner.lock().expect("article store mutex poisoned");
        shelf.by_id.values().filter(|a| predicate(a)).count() as u64
    }
}

impl Default for MemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_query(article: &Article, query: &str) -> bool {
    let q = query.to_lowercase();
    article.title.to_lowercase().contains(&q)
        || article.content.to_lowercase().contains(&q)
        || article.summary.to_lowercase().contains(&q)
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn save(&self, article: Article) -> Result<(), PersistenceError> {
        let mut shelf = self.inner.lock().expect("article store mutex poisoned");
        if let Some(&holder) = shelf.id_by_url.get(&article.url) {
            if holder != article.id {
                return Err(PersistenceError::ConstraintViolation(format!(
                    "url already stored: {}",
                    article.url
                )));
            }
        }
        if let Some(&holder) = shelf.id_by_fingerprint.get(article.fingerprint()) {
            if holder != article.id {
                return Err(PersistenceError::ConstraintViolation(format!(
                    "fingerprint already stored: {}",
                    article.fingerprint()
                )));
            }
        }
        if let Some(previous) = shelf.by_id.remove(&article.id) {
            shelf.unindex(&previous);
        }
        shelf
            .id_by_fingerprint
            .insert(article.fingerprint().to_string(), article.id);
        shelf.id_by_url.insert(article.url.clone(), article.id);
        shelf.by_id.insert(article.id, article);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, PersistenceError> {
        let shelf = self.inner.lock().expect("article store mutex poisoned");
        Ok(shelf.by_id.get(&id).cloned())
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<Article>, PersistenceError> {
        let shelf = self.inner.lock().expect("article store mutex poisoned");
        Ok(shelf
            .id_by_fingerprint
            .get(fingerprint)
            .and_then(|id| shelf.by_id.get(id))
            .cloned())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, PersistenceError> {
        let shelf = self.inner.lock().expect("article store mutex poisoned");
        Ok(shelf
            .id_by_url
            .get(url)
            .and_then(|id| shelf.by_id.get(id))
            .cloned())
    }

    async fn find_latest(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Article>, PersistenceError> {
        Ok(self.sorted_filtered(|_| true, limit, offset))
    }

    async fn find_by_category(
        &self,
        slug: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Article>, PersistenceError> {
        Ok(self.sorted_filtered(|a| a.category.slug() == slug, limit, offset))
    }

    async fn find_by_source(
        &self,
        source_name: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Article>, PersistenceError> {
        Ok(self.sorted_filtered(|a| a.source_name == source_name, limit, offset))
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Article>, PersistenceError> {
        Ok(self.sorted_filtered(|a| matches_query(a, query), limit, offset))
    }

    async fn count_total(&self) -> Result<u64, PersistenceError> {
        Ok(self.count_where(|_| true))
    }

    async fn count_by_category(&self, slug: &str) -> Result<u64, PersistenceError> {
        Ok(self.count_where(|a| a.category.slug() == slug))
    }

    async fn count_by_source(&self, source_name: &str) -> Result<u64, PersistenceError> {
        Ok(self.count_where(|a| a.source_name == source_name))
    }

    async fn count_search(&self, query: &str) -> Result<u64, PersistenceError> {
        Ok(self.count_where(|a| matches_query(a, query)))
    }

    async fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        let mut shelf = self.inner.lock().expect("article store mutex poisoned");
        if let Some(article) = shelf.by_id.remove(&id) {
            shelf.unindex(&article);
        }
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let mut shelf = self.inner.lock().expect("article store mutex poisoned");
        let expired: Vec<Uuid> = shelf
            .by_id
            .values()
            .filter(|a| a.published_at < cutoff)
            .map(|a| a.id)
            .collect();
        for id in &expired {
            if let Some(article) = shelf.by_id.remove(id) {
                shelf.unindex(&article);
            }
        }
        Ok(expired.len() as u64)
    }
}

pub struct MemorySourceStore {
    inner: Mutex<HashMap<Uuid, Source>>,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemorySourceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceStore for MemorySourceStore {
    async fn save(&self, source: Source) -> Result<(), PersistenceError> {
        let mut map = self.inner.lock().expect("source store mutex poisoned");
        if map
            .values()
            .any(|s| s.name == source.name && s.id != source.id)
        {
            return Err(PersistenceError::ConstraintViolation(format!(
                "source name already taken: {}",
                source.name
            )));
        }
        map.insert(source.id, source);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Source>, PersistenceError> {
        let map = self.inner.lock().expect("source store mutex poisoned");
        Ok(map.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Source>, PersistenceError> {
        let map = self.inner.lock().expect("source store mutex poisoned");
        Ok(map.values().find(|s| s.name == name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Source>, PersistenceError> {
        let map = self.inner.lock().expect("source store mutex poisoned");
        let mut all: Vec<Source> = map.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_active(&self) -> Result<Vec<Source>, PersistenceError> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|s| s.active)
            .collect())
    }

    async fn find_by_kind(&self, kind: SourceType) -> Result<Vec<Source>, PersistenceError> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|s| s.kind == kind)
            .collect())
    }

    async fn update_last_run(
        &self,
        id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let mut map = self.inner.lock().expect("source store mutex poisoned");
        match map.get_mut(&id) {
            Some(source) => {
                source.last_run_at = Some(timestamp);
                Ok(())
            }
            None => Err(PersistenceError::ConstraintViolation(format!(
                "unknown source: {id}"
            ))),
        }
    }

    async fn count(&self) -> Result<u64, PersistenceError> {
        let map = self.inner.lock().expect("source store mutex poisoned");
        Ok(map.len() as u64)
    }

    async fn count_active(&self) -> Result<u64, PersistenceError> {
        let map = self.inner.lock().expect("source store mutex poisoned");
        Ok(map.values().filter(|s| s.active).count() as u64)
    }

    async fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        let mut map = self.inner.lock().expect("source store mutex poisoned");
        map.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::RawArticle;
    use crate::category::Category;
    use chrono::Duration;

    fn article(title: &str, url: &str, published_at: DateTime<Utc>) -> Article {
        let source = Source::new("Wire", "https://wire.example/feed", SourceType::Rss, "");
        Article::from_raw(
            RawArticle {
                title: title.to_string(),
                content: format!("{title} body"),
                url: url.to_string(),
                published_at,
                ..RawArticle::default()
            },
            &source,
            Category::general(),
            published_at,
        )
    }

    #[tokio::test]
    async fn save_rejects_duplicate_url_and_fingerprint() {
        let store = MemoryArticleStore::new();
        let now = Utc::now();
        store.save(article("A", "https://e/a", now)).await.unwrap();

        let same_url = article("B", "https://e/a", now);
        assert!(matches!(
            store.save(same_url).await,
            Err(PersistenceError::ConstraintViolation(_))
        ));

        let same_content = article("A", "https://e/other", now);
        assert!(matches!(
            store.save(same_content).await,
            Err(PersistenceError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn indexes_follow_content_updates() {
        let store = MemoryArticleStore::new();
        let now = Utc::now();
        let a = article("A", "https://e/a", now);
        let old_fp = a.fingerprint().to_string();
        store.save(a.clone()).await.unwrap();

        let updated = a.with_updated_content("fresh body", "fresh summary");
        store.save(updated.clone()).await.unwrap();

        assert!(store.find_by_fingerprint(&old_fp).await.unwrap().is_none());
        let hit = store
            .find_by_fingerprint(updated.fingerprint())
            .await
            .unwrap()
            .expect("new fingerprint indexed");
        assert_eq!(hit.content, "fresh body");
    }

    #[tokio::test]
    async fn find_latest_orders_by_published_desc() {
        let store = MemoryArticleStore::new();
        let now = Utc::now();
        store
            .save(article("Old", "https://e/1", now - Duration::hours(2)))
            .await
            .unwrap();
        store.save(article("New", "https://e/2", now)).await.unwrap();
        let latest = store.find_latest(10, 0).await.unwrap();
        assert_eq!(latest[0].title, "New");
        assert_eq!(latest[1].title, "Old");
    }

    #[tokio::test]
    async fn delete_older_than_is_exclusive_at_cutoff() {
        let store = MemoryArticleStore::new();
        let cutoff = Utc::now();
        store
            .save(article("Expired", "https://e/1", cutoff - Duration::seconds(1)))
            .await
            .unwrap();
        store.save(article("AtCutoff", "https://e/2", cutoff)).await.unwrap();
        let deleted = store.delete_older_than(cutoff).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count_total().await.unwrap(), 1);
        // Second sweep deletes nothing.
        assert_eq!(store.delete_older_than(cutoff).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn source_names_are_unique() {
        let store = MemorySourceStore::new();
        store
            .save(Source::new("BBC", "https://bbc.example", SourceType::Rss, ""))
            .await
            .unwrap();
        let clash = Source::new("BBC", "https://other.example", SourceType::Api, "");
        assert!(matches!(
            store.save(clash).await,
            Err(PersistenceError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn update_last_run_touches_only_the_target() {
        let store = MemorySourceStore::new();
        let a = Source::new("A", "https://a.example", SourceType::Rss, "");
        let b = Source::new("B", "https://b.example", SourceType::Rss, "");
        let (a_id, b_id) = (a.id, b.id);
        store.save(a).await.unwrap();
        store.save(b).await.unwrap();

        let ts = Utc::now();
        store.update_last_run(a_id, ts).await.unwrap();
        assert_eq!(
            store.find_by_id(a_id).await.unwrap().unwrap().last_run_at,
            Some(ts)
        );
        assert!(store.find_by_id(b_id).await.unwrap().unwrap().last_run_at.is_none());
    }
}
