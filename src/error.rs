// src/error.rs
// Closed error taxonomy for the ingestion core. Adapter, persistence and
// configuration failures are caught at the orchestrator boundary and turned
// into a Failed ledger entry; nothing crosses the run boundary in batch mode.

use thiserror::Error;

/// Failures raised while pulling candidates from an external source.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("source unreachable: {0}")]
    Unreachable(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("malformed feed: {0}")]
    MalformedFeed(String),

    #[error("selector matched nothing: {0}")]
    SelectorMismatch(String),

    #[error("fetch timed out after {0} seconds")]
    Timeout(u64),
}

/// Failures raised by the article/source store collaborators.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Source misconfiguration detected before any network attempt.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}

/// Umbrella error for one ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
