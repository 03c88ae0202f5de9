//! Journal storage interface.

use async_trait::async_trait;

use crate::message::JournalMessage;
use crate::query::Query;

/// Result type for journal storage operations.
pub type Result<T> = std::result::Result<T, JournalError>;

/// Page size used by [`JournalStore::find`] callers that have no preference.
pub const DEFAULT_FIND_LIMIT: u64 = 100;

/// Errors that can occur during journal storage operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("PostgreSQL version too old: {version}, supported: >= 9.3")]
    VersionUnsupported { version: String },

    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Write error: {0}")]
    Write(#[source] sqlx::Error),

    #[error("Query execution error: {0}")]
    QueryExecution(#[source] sqlx::Error),

    #[error("Failed to decode stored column '{column}': {source}")]
    Decode {
        column: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Payload encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl JournalError {
    /// Classify a driver error: connectivity failures become
    /// [`JournalError::Connection`], anything else goes through `otherwise`.
    pub fn classify(err: sqlx::Error, otherwise: fn(sqlx::Error) -> JournalError) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => JournalError::Connection(err),
            other => otherwise(other),
        }
    }
}

/// Outcome of a best-effort table drop.
///
/// Dropping never fails from the caller's point of view; `Skipped` carries the
/// reason for anyone who wants to look.
#[derive(Debug)]
pub enum DropOutcome {
    Dropped,
    Skipped(JournalError),
}

impl DropOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, DropOutcome::Dropped)
    }
}

/// Interface for journal persistence.
///
/// Implementations:
/// - `PostgresJournal`: PostgreSQL storage (JSONB payloads on 9.4+, JSON on 9.3)
///
/// Methods take `&mut self`: an implementation owns a single connection, and
/// concurrent callers must serialize access themselves.
#[async_trait]
pub trait JournalStore: Send {
    /// Append a message.
    async fn insert(&mut self, message: &JournalMessage) -> Result<()>;

    /// Retrieve up to `limit` matching messages, skipping the first `offset`.
    ///
    /// No ordering is guaranteed.
    async fn find(&mut self, query: &Query, limit: u64, offset: u64)
        -> Result<Vec<JournalMessage>>;

    /// Count matching messages.
    async fn count(&mut self, query: &Query) -> Result<u64>;

    /// Drop the journal table, ignoring failures (e.g. the table is absent).
    async fn drop_table(&mut self) -> DropOutcome;
}
