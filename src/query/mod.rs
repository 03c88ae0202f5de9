//! Journal queries.
//!
//! A [`Query`] carries four independent constraint groups (identifier, topic,
//! time range and payload fields). The [`compiler`] turns it into a
//! parameterized SQL predicate.

pub mod compiler;
pub mod predicate;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use compiler::{CompiledQuery, QueryCompiler};
pub use predicate::{Escaper, Param};

/// Inclusive timestamp bounds. Either side may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeRange {
    pub from: Option<DateTime<FixedOffset>>,
    pub to: Option<DateTime<FixedOffset>>,
}

impl TimeRange {
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Structured journal query.
///
/// Groups are ANDed together. Within `id`, `topic` and `payload` the listed
/// items are ORed; `timestamp` requires both bounds that are set.
///
/// ```
/// use journal::query::Query;
///
/// let query = Query::new()
///     .topic("irc.*")
///     .payload("meta.level", 3);
/// assert!(!query.is_unconstrained());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Exact identifiers.
    pub id: BTreeSet<Uuid>,
    /// Case-insensitive glob patterns; `*` matches any substring.
    pub topic: BTreeSet<String>,
    pub timestamp: TimeRange,
    /// Dotted field path (`"meta.level"`) to expected value.
    pub payload: BTreeMap<String, serde_json::Value>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id.insert(id);
        self
    }

    pub fn topic(mut self, pattern: impl Into<String>) -> Self {
        self.topic.insert(pattern.into());
        self
    }

    pub fn since(mut self, from: DateTime<FixedOffset>) -> Self {
        self.timestamp.from = Some(from);
        self
    }

    pub fn until(mut self, to: DateTime<FixedOffset>) -> Self {
        self.timestamp.to = Some(to);
        self
    }

    pub fn payload(mut self, path: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(path.into(), value.into());
        self
    }

    /// True when no group constrains the result, i.e. the query matches every row.
    pub fn is_unconstrained(&self) -> bool {
        self.id.is_empty()
            && self.topic.is_empty()
            && self.timestamp.is_unbounded()
            && self.payload.is_empty()
    }
}
