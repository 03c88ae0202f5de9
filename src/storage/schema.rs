//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe statement
//! building.

use sea_query::{ColumnDef, Iden, PostgresQueryBuilder, Table};

pub use crate::query::predicate::PayloadType;

/// Journal table schema.
#[derive(Iden)]
pub enum Journal {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "topic"]
    Topic,
    #[iden = "timestamp"]
    Timestamp,
    #[iden = "payload"]
    Payload,
}

/// `CREATE TABLE IF NOT EXISTS journal (...)` for the given payload type.
pub fn create_journal_table(payload: PayloadType) -> String {
    let mut payload_col = ColumnDef::new(Journal::Payload);
    match payload {
        PayloadType::Jsonb => payload_col.json_binary(),
        PayloadType::Json => payload_col.json(),
    };

    Table::create()
        .table(Journal::Table)
        .if_not_exists()
        .col(ColumnDef::new(Journal::Id).uuid().primary_key())
        .col(ColumnDef::new(Journal::Topic).text().not_null())
        .col(
            ColumnDef::new(Journal::Timestamp)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(payload_col.not_null())
        .to_string(PostgresQueryBuilder)
}

/// `DROP TABLE journal`.
pub fn drop_journal_table() -> String {
    Table::drop()
        .table(Journal::Table)
        .to_string(PostgresQueryBuilder)
}

/// Single-row insert binding id, topic, timestamp and the encoded payload.
///
/// The payload is bound as text and cast to the column type.
pub fn insert_journal_row(payload: PayloadType) -> String {
    format!(
        "INSERT INTO {table} ({id}, {topic}, {timestamp}, {payload_col}) \
         VALUES ($1, $2, $3, CAST($4 AS {payload_type}))",
        table = Journal::Table.to_string(),
        id = Journal::Id.to_string(),
        topic = Journal::Topic.to_string(),
        timestamp = Journal::Timestamp.to_string(),
        payload_col = Journal::Payload.to_string(),
        payload_type = payload.as_sql(),
    )
}
