//! Server capability probe.
//!
//! Reads the server version once at connection time and decides whether the
//! payload column can use JSONB.

use sqlx::PgConnection;
use tracing::{info, warn};

use crate::interfaces::{JournalError, Result};

/// Oldest supported server (9.3, first release with usable JSON operators).
pub const MIN_VERSION_KEY: u64 = 930;
/// First server with JSONB (9.4).
pub const JSONB_VERSION_KEY: u64 = 940;

/// Parsed server version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    /// Version with a patch component, e.g. `"9.3.0"`.
    pub normalized: String,
    /// First three components concatenated, e.g. `930`.
    pub key: u64,
}

impl ServerVersion {
    /// Parse a `server_version` string.
    ///
    /// Distribution suffixes (`"16.2 (Debian 16.2-1.pgdg120+2)"`) are ignored
    /// and two-part versions get a `.0` patch component.
    pub fn parse(raw: &str) -> Result<Self> {
        let token = raw.split_whitespace().next().unwrap_or_default();
        let parts: Vec<&str> = token.split('.').collect();

        let two_part = parts.len() == 2
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
        let normalized = if two_part {
            format!("{}.0", token)
        } else {
            token.to_string()
        };

        let concatenated: String = normalized.split('.').take(3).collect();
        let digits: String = concatenated
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();

        let key = match digits.parse::<u64>() {
            Ok(key) if key >= MIN_VERSION_KEY => key,
            _ => {
                return Err(JournalError::VersionUnsupported {
                    version: normalized,
                })
            }
        };

        Ok(Self { normalized, key })
    }

    pub fn supports_jsonb(&self) -> bool {
        self.key >= JSONB_VERSION_KEY
    }
}

/// What the connected server can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCapabilities {
    pub version: ServerVersion,
    /// Native binary JSON payload column.
    pub jsonb: bool,
    /// `standard_conforming_strings`: backslashes in literals are plain characters.
    pub standard_conforming_strings: bool,
}

impl ServerCapabilities {
    pub fn from_version(version: ServerVersion, standard_conforming_strings: bool) -> Self {
        Self {
            jsonb: version.supports_jsonb(),
            version,
            standard_conforming_strings,
        }
    }
}

/// Probe a live connection.
pub async fn probe(conn: &mut PgConnection) -> Result<ServerCapabilities> {
    let raw = sqlx::query_scalar::<_, String>("SHOW server_version")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| JournalError::classify(e, JournalError::QueryExecution))?;

    let version = ServerVersion::parse(&raw)?;
    info!(version = %version.normalized, "journal storage: postgresql connected");

    let scs = sqlx::query_scalar::<_, String>("SHOW standard_conforming_strings")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| JournalError::classify(e, JournalError::QueryExecution))?;

    let capabilities = ServerCapabilities::from_version(version, scs.eq_ignore_ascii_case("on"));
    if !capabilities.jsonb {
        warn!(
            version = %capabilities.version.normalized,
            "journal storage: no jsonb support, consider upgrading postgres"
        );
    }

    Ok(capabilities)
}
