//! PostgreSQL JournalStore implementation.
//!
//! Owns a single connection. The payload column is JSONB when the server
//! supports it and JSON otherwise; the choice is made once by the capability
//! probe at connect time.

use async_trait::async_trait;
use sea_query::Iden;
use sqlx::postgres::PgArguments;
use sqlx::{Connection, PgConnection, Postgres};
use tracing::{debug, info};

use super::codec;
use super::escape::PostgresEscaper;
use super::probe::{self, ServerCapabilities};
use crate::config::PostgresConfig;
use crate::interfaces::{DropOutcome, JournalError, JournalStore, Result};
use crate::message::JournalMessage;
use crate::query::{CompiledQuery, Param, Query, QueryCompiler};
use crate::storage::schema::{self, Journal, PayloadType};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL implementation of JournalStore.
pub struct PostgresJournal {
    conn: PgConnection,
    capabilities: ServerCapabilities,
    escaper: PostgresEscaper,
}

impl PostgresJournal {
    /// Connect, probe the server, and make sure the journal table exists.
    ///
    /// With `config.drop` set the table is dropped first.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let mut conn = PgConnection::connect(&config.uri)
            .await
            .map_err(JournalError::Connection)?;

        let capabilities = probe::probe(&mut conn).await?;
        let escaper = PostgresEscaper::new(capabilities.standard_conforming_strings);

        let mut journal = Self {
            conn,
            capabilities,
            escaper,
        };

        if config.drop {
            journal.drop_table().await;
        }
        journal.create_table().await?;

        Ok(journal)
    }

    /// Capabilities detected at connect time.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    fn payload_type(&self) -> PayloadType {
        PayloadType::for_capability(self.capabilities.jsonb)
    }

    /// Create the journal table if it does not exist.
    pub async fn create_table(&mut self) -> Result<()> {
        let payload_type = self.payload_type();
        let sql = schema::create_journal_table(payload_type);

        sqlx::query(&sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| JournalError::classify(e, JournalError::QueryExecution))?;

        info!(payload = payload_type.as_sql(), "Journal table initialized");
        Ok(())
    }

    fn compile(&self, query: &Query) -> CompiledQuery {
        QueryCompiler::new(&self.escaper)
            .payload_type(self.payload_type())
            .compile(query)
    }

    /// `SELECT` for a page of matching rows.
    ///
    /// Limits beyond PostgreSQL's `bigint` range mean "no limit".
    pub fn find_sql(compiled: &CompiledQuery, limit: u64, offset: u64) -> String {
        let limit = if limit > i64::MAX as u64 {
            "ALL".to_string()
        } else {
            limit.to_string()
        };
        format!(
            "SELECT * FROM {} WHERE {} LIMIT {} OFFSET {}",
            Journal::Table.to_string(),
            compiled.where_clause(),
            limit,
            offset.min(i64::MAX as u64)
        )
    }

    /// `SELECT COUNT(*)` over matching rows.
    pub fn count_sql(compiled: &CompiledQuery) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            Journal::Table.to_string(),
            compiled.where_clause()
        )
    }

    /// Close the connection gracefully.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await.map_err(JournalError::Connection)
    }
}

fn bind_params<'q>(mut query: PgQuery<'q>, params: &[Param]) -> PgQuery<'q> {
    for param in params {
        query = match param {
            Param::Uuid(id) => query.bind(*id),
            Param::Text(text) => query.bind(text.clone()),
            Param::Timestamp(ts) => query.bind(*ts),
        };
    }
    query
}

#[async_trait]
impl JournalStore for PostgresJournal {
    async fn insert(&mut self, message: &JournalMessage) -> Result<()> {
        let payload = codec::encode_payload(&message.payload)?;
        let sql = schema::insert_journal_row(self.payload_type());

        sqlx::query(&sql)
            .bind(message.id)
            .bind(message.topic.as_str())
            .bind(message.timestamp)
            .bind(payload)
            .execute(&mut self.conn)
            .await
            .map_err(|e| JournalError::classify(e, JournalError::Write))?;

        debug!(id = %message.id, topic = %message.topic, "Inserted journal message");
        Ok(())
    }

    async fn find(
        &mut self,
        query: &Query,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<JournalMessage>> {
        let compiled = self.compile(query);
        let sql = Self::find_sql(&compiled, limit, offset);

        let rows = bind_params(sqlx::query(&sql), &compiled.params)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| JournalError::classify(e, JournalError::QueryExecution))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            messages.push(codec::decode_row(row)?);
        }

        debug!(matched = messages.len(), limit, offset, "Journal find");
        Ok(messages)
    }

    async fn count(&mut self, query: &Query) -> Result<u64> {
        let compiled = self.compile(query);
        let sql = Self::count_sql(&compiled);

        let count: i64 = bind_params(sqlx::query(&sql), &compiled.params)
            .fetch_one(&mut self.conn)
            .await
            .and_then(|row| sqlx::Row::try_get(&row, 0))
            .map_err(|e| JournalError::classify(e, JournalError::QueryExecution))?;

        Ok(count.max(0) as u64)
    }

    async fn drop_table(&mut self) -> DropOutcome {
        let sql = schema::drop_journal_table();

        match sqlx::query(&sql).execute(&mut self.conn).await {
            Ok(_) => {
                info!("Journal table dropped");
                DropOutcome::Dropped
            }
            Err(e) => {
                debug!(error = %e, "Journal table drop skipped");
                DropOutcome::Skipped(JournalError::classify(e, JournalError::QueryExecution))
            }
        }
    }
}
