//! Row codec: `JournalMessage` <-> stored journal row.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::interfaces::{JournalError, Result};
use crate::message::JournalMessage;
use crate::query::predicate::Column;

/// Serialize a payload for the `payload` column.
pub fn encode_payload(payload: &serde_json::Value) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}

fn column<'r, T>(row: &'r PgRow, column: Column) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    let name = column.as_str();
    row.try_get(name)
        .map_err(|source| JournalError::Decode {
            column: name,
            source,
        })
}

/// Rebuild a message from a `SELECT *` row.
///
/// Timestamps come back from the server in UTC; the caller's offset is not
/// stored.
pub fn decode_row(row: &PgRow) -> Result<JournalMessage> {
    let id: Uuid = column(row, Column::Id)?;
    let topic: String = column(row, Column::Topic)?;
    let timestamp: DateTime<Utc> = column(row, Column::Timestamp)?;
    // Decodes both JSON and JSONB columns.
    let payload: serde_json::Value = column(row, Column::Payload)?;

    Ok(JournalMessage {
        id,
        topic,
        timestamp: timestamp.fixed_offset(),
        payload,
    })
}
