//! Journal - PostgreSQL persistence backend for an append-only event journal.
//!
//! Stores timestamped, topic-tagged messages with JSON payloads and answers
//! structured queries over them (identifier, topic glob, time range and
//! payload fields) with pagination and counting.
//!
//! ```rust,ignore
//! use journal::config::PostgresConfig;
//! use journal::interfaces::JournalStore;
//! use journal::query::Query;
//! use journal::storage::PostgresJournal;
//!
//! let mut journal = PostgresJournal::connect(&PostgresConfig::default()).await?;
//! let hits = journal.find(&Query::new().topic("irc.*"), 100, 0).await?;
//! ```

pub mod config;
pub mod interfaces;
pub mod message;
pub mod query;
pub mod storage;
pub mod utils;

pub use interfaces::{JournalError, JournalStore};
pub use message::JournalMessage;
pub use query::Query;
