//! Contact persistence gateway (Postgres).
//!
//! Each call opens a fresh connection and closes it when done; the bot's
//! write volume is a handful of rows per conversation, so a pool would only
//! hold idle connections against the database.

use std::fmt;

use async_trait::async_trait;

use crate::formatting;

const ERROR_DETAIL_LIMIT: usize = 150;

/// Which contact table an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    Email,
    Phone,
}

impl ContactKind {
    pub fn table(self) -> &'static str {
        match self {
            ContactKind::Email => "emails",
            ContactKind::Phone => "phone_numbers",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            ContactKind::Email => "email",
            ContactKind::Phone => "phone",
        }
    }

    /// Plural noun for user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            ContactKind::Email => "email addresses",
            ContactKind::Phone => "phone numbers",
        }
    }
}

/// Database failure carried back to the dispatcher as data. The detail text
/// is bounded so a driver dump never floods the chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreError(String);

impl StoreError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(formatting::clip(&detail.into(), ERROR_DETAIL_LIMIT))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StoreError {}

/// Outcome of a batch insert: how many values were submitted and how many
/// actually landed (duplicates are skipped by the database).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsertReport {
    pub submitted: usize,
    pub inserted: u64,
}

#[async_trait]
pub trait ContactGateway: Send + Sync {
    async fn insert(&self, kind: ContactKind, values: &[String])
        -> Result<InsertReport, StoreError>;

    async fn query_recent(&self, kind: ContactKind, limit: i64)
        -> Result<Vec<String>, StoreError>;
}

/// Postgres-backed gateway.
pub struct ContactStore {
    url: String,
}

impl ContactStore {
    pub fn new(url: String) -> Self {
        Self { url }
    }

    async fn connect(&self) -> Result<sqlx::PgConnection, StoreError> {
        use sqlx::Connection;
        sqlx::PgConnection::connect(&self.url)
            .await
            .map_err(|e| StoreError::new(e.to_string()))
    }
}

#[async_trait]
impl ContactGateway for ContactStore {
    async fn insert(
        &self,
        kind: ContactKind,
        values: &[String],
    ) -> Result<InsertReport, StoreError> {
        use sqlx::Connection;

        let mut conn = self.connect().await?;

        // Table and column names come from the ContactKind enum, never from
        // user input; only the value itself is bound.
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1) ON CONFLICT DO NOTHING",
            kind.table(),
            kind.column()
        );

        let mut inserted = 0u64;
        for value in values {
            let done = sqlx::query(&sql)
                .bind(value)
                .execute(&mut conn)
                .await
                .map_err(|e| StoreError::new(e.to_string()))?;
            inserted += done.rows_affected();
        }

        let _ = conn.close().await;
        Ok(InsertReport {
            submitted: values.len(),
            inserted,
        })
    }

    async fn query_recent(
        &self,
        kind: ContactKind,
        limit: i64,
    ) -> Result<Vec<String>, StoreError> {
        use sqlx::Connection;

        let mut conn = self.connect().await?;

        let sql = format!(
            "SELECT {} FROM {} ORDER BY id DESC LIMIT $1",
            kind.column(),
            kind.table()
        );
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| StoreError::new(e.to_string()))?;

        let _ = conn.close().await;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }
}
