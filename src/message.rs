//! Journal message entity.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single timestamped, topic-tagged entry in the journal.
///
/// Messages are immutable once built; storage backends only serialize and
/// deserialize them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalMessage {
    pub id: Uuid,
    pub topic: String,
    pub timestamp: DateTime<FixedOffset>,
    pub payload: serde_json::Value,
}

impl JournalMessage {
    /// Create a message with a fresh identifier, stamped with the current time.
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::with_timestamp(topic, Utc::now().fixed_offset(), payload)
    }

    /// Create a message with a fresh identifier and an explicit timestamp.
    pub fn with_timestamp(
        topic: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            timestamp,
            payload,
        }
    }
}
