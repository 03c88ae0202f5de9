//! PostgreSQL implementation of the journal storage interface.

pub mod codec;
pub mod escape;
mod journal_store;
pub mod probe;

pub use escape::PostgresEscaper;
pub use journal_store::PostgresJournal;
pub use probe::{ServerCapabilities, ServerVersion};
