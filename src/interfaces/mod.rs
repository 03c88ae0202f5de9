//! Abstract interfaces for journal components.
//!
//! These traits define the contracts for:
//! - Journal storage (insert, find, count, drop)

pub mod journal_store;

pub use journal_store::{DropOutcome, JournalError, JournalStore, Result, DEFAULT_FIND_LIMIT};
