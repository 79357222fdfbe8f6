//! Executable seed units
//!
//! A seed implements [`Seed`]; the migrator hands it a [`SeedContext`] through
//! which every statement is issued. A live context runs all of one seed's
//! statements on a single transaction, so session state such as temporary
//! tables or `SET IDENTITY_INSERT` carries from one statement to the next and
//! a failing seed leaves nothing behind. In pretend mode the context records
//! the statements instead of executing them.

use async_trait::async_trait;
use sqlx::{Any, AnyConnection, AnyPool, Executor, Transaction};

use crate::connection::{execute_with, Connection, SqlValue};
use crate::dialect::Driver;
use crate::error::{GardenerError, GardenerResult};

/// A seed script
///
/// `down` is optional: the default does nothing, so rolling back a seed
/// without one only removes it from the ledger.
#[async_trait]
pub trait Seed: Send + Sync {
    /// Insert or mutate the seed's data
    async fn up(&self, ctx: &mut SeedContext) -> GardenerResult<()>;

    /// Revert what `up` did
    async fn down(&self, _ctx: &mut SeedContext) -> GardenerResult<()> {
        Ok(())
    }
}

/// Statement sink handed to seeds
pub struct SeedContext {
    connection: Connection,
    transaction: Option<Transaction<'static, Any>>,
    statements: Vec<String>,
}

impl SeedContext {
    /// Open a transaction on `connection` for one seed
    pub async fn begin(connection: Connection) -> GardenerResult<Self> {
        let transaction = connection.pool().begin().await.map_err(|e| {
            GardenerError::storage(format!(
                "Failed to start transaction on [{}]: {}",
                connection.name(),
                e
            ))
        })?;

        Ok(Self {
            connection,
            transaction: Some(transaction),
            statements: Vec::new(),
        })
    }

    /// A context that records statements without touching the database
    pub fn pretend(connection: Connection) -> Self {
        Self {
            connection,
            transaction: None,
            statements: Vec::new(),
        }
    }

    /// Commit everything the seed did, returning the statements issued
    pub async fn commit(self) -> GardenerResult<Vec<String>> {
        if let Some(transaction) = self.transaction {
            transaction
                .commit()
                .await
                .map_err(|e| GardenerError::storage(format!("Failed to commit seed: {}", e)))?;
        }
        Ok(self.statements)
    }

    /// Discard everything the seed did
    pub async fn rollback(self) -> GardenerResult<()> {
        if let Some(transaction) = self.transaction {
            transaction
                .rollback()
                .await
                .map_err(|e| GardenerError::storage(format!("Failed to roll back seed: {}", e)))?;
        }
        Ok(())
    }

    pub fn driver(&self) -> Driver {
        self.connection.driver()
    }

    pub fn connection_name(&self) -> &str {
        self.connection.name()
    }

    /// Whether statements are being recorded rather than executed
    pub fn is_pretending(&self) -> bool {
        self.transaction.is_none()
    }

    /// The seed's transaction, for queries beyond [`statement`](Self::statement)
    /// and [`execute`](Self::execute); `None` while pretending
    pub fn transaction(&mut self) -> Option<&mut AnyConnection> {
        self.transaction.as_deref_mut()
    }

    /// Direct pool access
    ///
    /// Queries issued on the pool run outside the seed's transaction and
    /// bypass pretend mode.
    pub fn pool(&self) -> &AnyPool {
        self.connection.pool()
    }

    /// Statements issued so far
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub(crate) fn into_statements(self) -> Vec<String> {
        self.statements
    }

    /// Run an unprepared statement, returning the affected row count
    pub async fn statement(&mut self, sql: &str) -> GardenerResult<u64> {
        self.statements.push(sql.to_string());
        let Some(conn) = self.transaction.as_deref_mut() else {
            return Ok(0);
        };

        tracing::debug!(connection = self.connection.name(), sql, "executing statement");

        let result = conn
            .execute(sql)
            .await
            .map_err(|e| GardenerError::statement(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Run a statement with positional parameters
    ///
    /// Placeholders follow the driver (`$1` for PostgreSQL, `?` otherwise);
    /// [`param`](Self::param) writes the right one.
    pub async fn execute(&mut self, sql: &str, params: Vec<SqlValue>) -> GardenerResult<u64> {
        if params.is_empty() {
            self.statements.push(sql.to_string());
        } else {
            let bindings: Vec<String> = params.iter().map(ToString::to_string).collect();
            self.statements
                .push(format!("{} [{}]", sql, bindings.join(", ")));
        }
        let Some(conn) = self.transaction.as_deref_mut() else {
            return Ok(0);
        };

        tracing::debug!(connection = self.connection.name(), sql, "executing statement");

        let result = execute_with(conn, sql, &params)
            .await
            .map_err(|e| GardenerError::statement(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Placeholder for the 1-based parameter `index` in the active dialect
    pub fn param(&self, index: usize) -> String {
        self.connection.dialect().param(index)
    }

    /// Allow explicit values in an identity column (SQL Server only)
    pub async fn enable_identity_insert(&mut self, table: &str) -> GardenerResult<()> {
        if let Some(sql) = self.connection.dialect().identity_insert_sql(table, true) {
            self.statement(&sql).await?;
        }
        Ok(())
    }

    /// Undo [`enable_identity_insert`](Self::enable_identity_insert)
    pub async fn disable_identity_insert(&mut self, table: &str) -> GardenerResult<()> {
        if let Some(sql) = self.connection.dialect().identity_insert_sql(table, false) {
            self.statement(&sql).await?;
        }
        Ok(())
    }

    /// Reset a table's auto-increment counter (MySQL and SQL Server)
    pub async fn reseed_table(&mut self, table: &str, start: i64) -> GardenerResult<()> {
        if let Some(sql) = self.connection.dialect().reseed_sql(table, start) {
            self.statement(&sql).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::any::AnyPoolOptions;
    use tempfile::TempDir;

    fn connection(dir: &TempDir, driver: Driver) -> Connection {
        sqlx::any::install_default_drivers();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("ctx.db").display());
        let pool = AnyPoolOptions::new().connect_lazy(&url).unwrap();
        Connection::new("default", driver, pool)
    }

    async fn count(pool: &AnyPool, sql: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await?;
        Ok(count)
    }

    #[tokio::test]
    async fn test_pretend_records_without_executing() {
        let dir = TempDir::new().unwrap();
        let mut ctx = SeedContext::pretend(connection(&dir, Driver::Sqlite));

        assert!(ctx.is_pretending());
        assert!(ctx.transaction().is_none());
        ctx.statement("CREATE TABLE never (id INTEGER)").await.unwrap();
        ctx.execute(
            "INSERT INTO never (id) VALUES (?)",
            vec![SqlValue::Int(1)],
        )
        .await
        .unwrap();

        assert_eq!(
            ctx.statements(),
            &[
                "CREATE TABLE never (id INTEGER)".to_string(),
                "INSERT INTO never (id) VALUES (?) [1]".to_string()
            ]
        );

        assert!(count(ctx.pool(), "SELECT COUNT(*) FROM never").await.is_err());
    }

    #[tokio::test]
    async fn test_statements_execute_and_commit() {
        let dir = TempDir::new().unwrap();
        let conn = connection(&dir, Driver::Sqlite);
        let mut ctx = SeedContext::begin(conn.clone()).await.unwrap();

        ctx.statement("CREATE TABLE colors (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();
        let sql = format!("INSERT INTO colors (name) VALUES ({})", ctx.param(1));
        let affected = ctx.execute(&sql, vec!["red".into()]).await.unwrap();
        assert_eq!(affected, 1);

        let statements = ctx.commit().await.unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(count(conn.pool(), "SELECT COUNT(*) FROM colors").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_session_state_carries_between_statements() {
        let dir = TempDir::new().unwrap();
        let conn = connection(&dir, Driver::Sqlite);
        sqlx::query("CREATE TABLE events (name TEXT)")
            .execute(conn.pool())
            .await
            .unwrap();

        let mut ctx = SeedContext::begin(conn.clone()).await.unwrap();
        ctx.statement("CREATE TEMP TABLE scratch (name TEXT)").await.unwrap();
        for i in 0..20 {
            let sql = format!("INSERT INTO scratch (name) VALUES ({})", ctx.param(1));
            ctx.execute(&sql, vec![format!("row{}", i).into()]).await.unwrap();
        }
        ctx.statement("INSERT INTO events (name) SELECT name FROM scratch")
            .await
            .unwrap();

        let (inside,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scratch")
            .fetch_one(ctx.transaction().unwrap())
            .await
            .unwrap();
        assert_eq!(inside, 20);

        ctx.commit().await.unwrap();
        assert_eq!(count(conn.pool(), "SELECT COUNT(*) FROM events").await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_rollback_discards_statements() {
        let dir = TempDir::new().unwrap();
        let conn = connection(&dir, Driver::Sqlite);
        sqlx::query("CREATE TABLE events (name TEXT)")
            .execute(conn.pool())
            .await
            .unwrap();

        let mut ctx = SeedContext::begin(conn.clone()).await.unwrap();
        ctx.statement("INSERT INTO events (name) VALUES ('kept?')")
            .await
            .unwrap();
        let err = ctx.statement("INSERT INTO missing VALUES (1)").await.unwrap_err();
        assert!(matches!(err, GardenerError::Statement { .. }));
        ctx.rollback().await.unwrap();

        assert_eq!(count(conn.pool(), "SELECT COUNT(*) FROM events").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_maintenance_helpers_follow_driver() {
        let dir = TempDir::new().unwrap();

        let mut sqlite = SeedContext::pretend(connection(&dir, Driver::Sqlite));
        sqlite.enable_identity_insert("users").await.unwrap();
        sqlite.reseed_table("users", 0).await.unwrap();
        sqlite.disable_identity_insert("users").await.unwrap();
        assert!(sqlite.statements().is_empty());

        let mut mssql = SeedContext::pretend(connection(&dir, Driver::SqlServer));
        mssql.enable_identity_insert("users").await.unwrap();
        mssql.reseed_table("users", 0).await.unwrap();
        mssql.disable_identity_insert("users").await.unwrap();
        assert_eq!(
            mssql.into_statements(),
            vec![
                "SET IDENTITY_INSERT users ON",
                "DBCC CHECKIDENT (users, RESEED, 0)",
                "SET IDENTITY_INSERT users OFF"
            ]
        );

        let mut mysql = SeedContext::pretend(connection(&dir, Driver::MySql));
        mysql.enable_identity_insert("users").await.unwrap();
        mysql.reseed_table("users", 5).await.unwrap();
        assert_eq!(mysql.statements(), &["ALTER TABLE users AUTO_INCREMENT = 5".to_string()]);
    }
}
