// src/retention.rs
// Purges articles published before the retention horizon. The boundary is
// exclusive: an article published exactly `retention_days` ago is retained.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use crate::error::PersistenceError;
use crate::store::{ArticleStore, Clock};

pub const DEFAULT_RETENTION_DAYS: u32 = 30;

pub struct RetentionSweeper {
    articles: Arc<dyn ArticleStore>,
    clock: Arc<dyn Clock>,
}

impl RetentionSweeper {
    pub fn new(articles: Arc<dyn ArticleStore>, clock: Arc<dyn Clock>) -> Self {
        Self { articles, clock }
    }

    /// Delete everything published before `now - retention_days`; returns
    /// the number deleted. Safe to repeat: a second sweep with no newly
    /// expired articles deletes zero.
    pub async fn purge_expired(&self, retention_days: u32) -> Result<u64, PersistenceError> {
        let cutoff = self.clock.now() - Duration::days(i64::from(retention_days));
        let deleted = self.articles.delete_older_than(cutoff).await?;
        info!(
            target: "retention",
            deleted,
            retention_days,
            "retention sweep finished"
        );
        Ok(deleted)
    }
}
