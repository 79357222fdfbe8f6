//! Seed ledger
//!
//! [`GardenerRepository`] owns the table recording which seeds ran, in which
//! environment and in which batch. One instance is reused across a whole
//! command, scoped with [`set_env`](GardenerRepository::set_env) and
//! [`set_source`](GardenerRepository::set_source).

use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::Row;

use crate::connection::{execute_with, Connection, ConnectionResolver, SqlValue};
use crate::error::{GardenerError, GardenerResult};

/// A row of the ledger table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub id: i64,
    pub seed: String,
    pub env: String,
    pub batch: i32,
}

impl SeedRecord {
    fn from_row(row: &AnyRow) -> GardenerResult<Self> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| GardenerError::storage(format!("Failed to get seed record id: {}", e)))?;
        let seed: String = row
            .try_get("seed")
            .map_err(|e| GardenerError::storage(format!("Failed to get seed name: {}", e)))?;
        let env: String = row
            .try_get("env")
            .map_err(|e| GardenerError::storage(format!("Failed to get seed env: {}", e)))?;
        let batch: i64 = row
            .try_get("batch")
            .map_err(|e| GardenerError::storage(format!("Failed to get seed batch: {}", e)))?;

        Ok(Self {
            id,
            seed,
            env,
            batch: to_batch(batch)?,
        })
    }
}

fn to_batch(value: i64) -> GardenerResult<i32> {
    i32::try_from(value)
        .map_err(|_| GardenerError::storage(format!("Batch number {} out of range", value)))
}

/// Database-backed seed ledger
#[derive(Debug, Clone)]
pub struct GardenerRepository {
    resolver: ConnectionResolver,
    table: String,
    connection: Option<String>,
    env: Option<String>,
    default_env: String,
}

impl GardenerRepository {
    /// Create a ledger on `table`; `default_env` applies until [`set_env`](Self::set_env)
    pub fn new(
        resolver: ConnectionResolver,
        table: impl Into<String>,
        default_env: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            table: table.into(),
            connection: None,
            env: None,
            default_env: default_env.into(),
        }
    }

    /// Scope subsequent calls to an environment (`None` restores the default)
    pub fn set_env(&mut self, env: Option<String>) {
        self.env = env.filter(|env| !env.trim().is_empty());
    }

    /// Explicitly requested environment, if any
    pub fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    /// Environment the ledger reads and writes
    pub fn effective_env(&self) -> &str {
        self.env.as_deref().unwrap_or(&self.default_env)
    }

    /// Scope subsequent calls to a named connection (`None` for the default)
    pub fn set_source(&mut self, name: Option<String>) {
        self.connection = name;
    }

    pub fn source(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn resolver(&self) -> &ConnectionResolver {
        &self.resolver
    }

    /// Resolve the connection the ledger is scoped to
    pub fn connection(&self) -> GardenerResult<Connection> {
        self.resolver.connection(self.connection.as_deref())
    }

    /// Seeds ran in the current environment, by batch then name
    pub async fn get_ran(&self) -> GardenerResult<Vec<String>> {
        Ok(self
            .get_records()
            .await?
            .into_iter()
            .map(|record| record.seed)
            .collect())
    }

    /// All records of the current environment, by batch then name
    pub async fn get_records(&self) -> GardenerResult<Vec<SeedRecord>> {
        let connection = self.connection()?;
        let sql = format!(
            "SELECT id, seed, env, batch FROM {} WHERE env = {} ORDER BY batch ASC, seed ASC",
            self.table,
            connection.dialect().param(1)
        );

        self.fetch_records(&connection, &sql, &[self.effective_env().into()])
            .await
    }

    /// The `steps` most recently named records of the current environment
    pub async fn get_migrations(&self, steps: usize) -> GardenerResult<Vec<SeedRecord>> {
        if steps == 0 {
            return Ok(Vec::new());
        }

        let connection = self.connection()?;
        let dialect = connection.dialect();
        let sql = format!(
            "SELECT id, seed, env, batch FROM {} WHERE env = {} AND batch >= 1 ORDER BY seed DESC {}",
            self.table,
            dialect.param(1),
            dialect.limit_sql(steps)
        );

        self.fetch_records(&connection, &sql, &[self.effective_env().into()])
            .await
    }

    /// Records of the highest batch in the current environment, names descending
    pub async fn get_last(&self) -> GardenerResult<Vec<SeedRecord>> {
        let Some(batch) = self.get_last_batch_number().await? else {
            return Ok(Vec::new());
        };

        let connection = self.connection()?;
        let dialect = connection.dialect();
        let sql = format!(
            "SELECT id, seed, env, batch FROM {} WHERE env = {} AND batch = {} ORDER BY seed DESC",
            self.table,
            dialect.param(1),
            dialect.param(2)
        );

        self.fetch_records(
            &connection,
            &sql,
            &[self.effective_env().into(), batch.into()],
        )
        .await
    }

    /// Highest batch of the current environment; `None` before the first run
    pub async fn get_last_batch_number(&self) -> GardenerResult<Option<i32>> {
        let connection = self.connection()?;
        let sql = format!(
            "SELECT COALESCE(MAX(batch), 0) AS batch FROM {} WHERE env = {}",
            self.table,
            connection.dialect().param(1)
        );

        let row = sqlx::query(&sql)
            .bind(self.effective_env().to_string())
            .fetch_one(connection.pool())
            .await
            .map_err(|e| GardenerError::storage(format!("Failed to get last batch: {}", e)))?;

        // Batches start at 1, so 0 means the environment has no rows
        let batch: i64 = row
            .try_get(0)
            .map_err(|e| GardenerError::storage(format!("Failed to get last batch: {}", e)))?;
        match batch {
            0 => Ok(None),
            batch => to_batch(batch).map(Some),
        }
    }

    pub async fn get_next_batch_number(&self) -> GardenerResult<i32> {
        Ok(self.get_last_batch_number().await?.unwrap_or(0) + 1)
    }

    /// Record that `seed` ran in `batch`
    pub async fn log(&self, seed: &str, batch: i32) -> GardenerResult<()> {
        let connection = self.connection()?;
        let dialect = connection.dialect();
        let sql = format!(
            "INSERT INTO {} (seed, env, batch) VALUES ({}, {}, {})",
            self.table,
            dialect.param(1),
            dialect.param(2),
            dialect.param(3)
        );

        tracing::debug!(seed, env = self.effective_env(), batch, "logging seed");

        execute_with(
            connection.pool(),
            &sql,
            &[seed.into(), self.effective_env().into(), batch.into()],
        )
        .await
        .map_err(|e| GardenerError::storage(format!("Failed to log seed {}: {}", seed, e)))?;
        Ok(())
    }

    /// Remove `seed` from the current environment's log
    pub async fn delete(&self, seed: &str) -> GardenerResult<()> {
        let connection = self.connection()?;
        let dialect = connection.dialect();
        let sql = format!(
            "DELETE FROM {} WHERE env = {} AND seed = {}",
            self.table,
            dialect.param(1),
            dialect.param(2)
        );

        tracing::debug!(seed, env = self.effective_env(), "removing seed from ledger");

        execute_with(
            connection.pool(),
            &sql,
            &[self.effective_env().into(), seed.into()],
        )
        .await
        .map_err(|e| GardenerError::storage(format!("Failed to delete seed {}: {}", seed, e)))?;
        Ok(())
    }

    /// Create the ledger table if it does not exist
    pub async fn create_repository(&self) -> GardenerResult<()> {
        let connection = self.connection()?;
        let sql = connection.dialect().create_ledger_sql(&self.table);

        sqlx::query(&sql)
            .execute(connection.pool())
            .await
            .map_err(|e| GardenerError::storage(format!("Failed to create seed table: {}", e)))?;
        Ok(())
    }

    pub async fn repository_exists(&self) -> GardenerResult<bool> {
        let connection = self.connection()?;

        let row = sqlx::query(connection.dialect().table_exists)
            .bind(self.table.clone())
            .fetch_one(connection.pool())
            .await
            .map_err(|e| GardenerError::storage(format!("Failed to inspect schema: {}", e)))?;

        let count: i64 = row
            .try_get(0)
            .map_err(|e| GardenerError::storage(format!("Failed to inspect schema: {}", e)))?;
        Ok(count > 0)
    }

    async fn fetch_records(
        &self,
        connection: &Connection,
        sql: &str,
        params: &[SqlValue],
    ) -> GardenerResult<Vec<SeedRecord>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = param.bind(query);
        }

        let rows = query
            .fetch_all(connection.pool())
            .await
            .map_err(|e| GardenerError::storage(format!("Failed to query seed table: {}", e)))?;

        rows.iter().map(SeedRecord::from_row).collect()
    }
}
