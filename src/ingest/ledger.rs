// src/ingest/ledger.rs
// Append-only record of every ingestion attempt. Entries move Started →
// Completed or Started → Failed and are immutable once terminal; the counter
// fields freeze at the terminal transition.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::source::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Started,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub source_id: Uuid,
    pub source_name: String,
    pub status: RunStatus,
    pub articles_found: u64,
    pub articles_new: u64,
    /// Set only on Failed.
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// In-memory run log, bounded to the newest `cap` entries. One writer at a
/// time per entry is guaranteed by the single guard.
#[derive(Debug)]
pub struct RunLedger {
    inner: Mutex<Vec<RunRecord>>,
    cap: usize,
}

const MAX_CAP: usize = 10_000;

impl RunLedger {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            cap: cap.min(MAX_CAP),
        }
    }

    /// Open a Started entry for one ingestion attempt; returns its id.
    pub fn open(&self, source: &Source, at: DateTime<Utc>) -> Uuid {
        let record = RunRecord {
            id: Uuid::new_v4(),
            source_id: source.id,
            source_name: source.name.clone(),
            status: RunStatus::Started,
            articles_found: 0,
            articles_new: 0,
            error: None,
            started_at: at,
            finished_at: None,
        };
        let id = record.id;
        let mut log = self.inner.lock().expect("run ledger mutex poisoned");
        log.push(record);
        if log.len() > self.cap {
            let excess = log.len() - self.cap;
            log.drain(0..excess);
        }
        id
    }

    pub fn complete(
        &self,
        id: Uuid,
        articles_found: u64,
        articles_new: u64,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        self.finish(id, RunStatus::Completed, articles_found, articles_new, None, at)
    }

    pub fn fail(
        &self,
        id: Uuid,
        articles_found: u64,
        articles_new: u64,
        error: String,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        self.finish(
            id,
            RunStatus::Failed,
            articles_found,
            articles_new,
            Some(error),
            at,
        )
    }

    fn finish(
        &self,
        id: Uuid,
        status: RunStatus,
        articles_found: u64,
        articles_new: u64,
        error: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let mut log = self.inner.lock().expect("run ledger mutex poisoned");
        let record = log
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PersistenceError::ConstraintViolation(format!("unknown run: {id}")))?;
        if record.status.is_terminal() {
            return Err(PersistenceError::ConstraintViolation(format!(
                "run {id} already {:?}",
                record.status
            )));
        }
        record.status = status;
        record.articles_found = articles_found;
        record.articles_new = articles_new;
        record.error = error;
        record.finished_at = Some(at);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<RunRecord> {
        let log = self.inner.lock().expect("run ledger mutex poisoned");
        log.iter().find(|r| r.id == id).cloned()
    }

    /// Newest-last slice of the most recent `n` entries.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<RunRecord> {
        let log = self.inner.lock().expect("run ledger mutex poisoned");
        let start = log.len().saturating_sub(n);
        log[start..].to_vec()
    }
}

impl Default for RunLedger {
    fn default() -> Self {
        Self::with_capacity(MAX_CAP)
    }
}
