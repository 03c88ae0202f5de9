//! Storage configuration types.

use serde::Deserialize;

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// PostgreSQL-specific configuration.
    pub postgres: PostgresConfig,
}

/// PostgreSQL-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// PostgreSQL connection URI.
    pub uri: String,
    /// Drop the journal table before recreating it.
    /// Destructive; meant for tests and resets.
    /// Default: false
    pub drop: bool,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            uri: "postgres://localhost:5432/journal".to_string(),
            drop: false,
        }
    }
}

impl PostgresConfig {
    /// Config for the given URI, keeping the table.
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            drop: false,
        }
    }
}
