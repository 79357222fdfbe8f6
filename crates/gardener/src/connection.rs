//! Named database connections
//!
//! Connections are `sqlx` [`AnyPool`]s created lazily from the configuration
//! and cached by name, so the ledger and the seeds of one run share a pool.

use dashmap::DashMap;
use sqlx::any::{AnyPoolOptions, AnyQueryResult};
use sqlx::{Any, AnyPool, Executor};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{ConnectionConfig, GardenerConfig};
use crate::dialect::{Dialect, Driver};
use crate::error::{GardenerError, GardenerResult};

/// A resolved database connection
#[derive(Clone)]
pub struct Connection {
    name: String,
    driver: Driver,
    pool: AnyPool,
}

impl Connection {
    pub fn new(name: impl Into<String>, driver: Driver, pool: AnyPool) -> Self {
        Self {
            name: name.into(),
            driver,
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn dialect(&self) -> &'static Dialect {
        self.driver.dialect()
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("driver", &self.driver)
            .finish()
    }
}

/// A value bound to a statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub(crate) fn bind<'q>(
        &self,
        query: sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>> {
        match self {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Bool(value) => query.bind(*value),
            SqlValue::Int(value) => query.bind(*value),
            SqlValue::Float(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.clone()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(value) => write!(f, "{}", value),
            SqlValue::Int(value) => write!(f, "{}", value),
            SqlValue::Float(value) => write!(f, "{}", value),
            SqlValue::Text(value) => write!(f, "'{}'", value.replace('\'', "''")),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Execute `sql` with positional `params` on a pool or a single connection
pub(crate) async fn execute_with<'c, E>(
    executor: E,
    sql: &str,
    params: &[SqlValue],
) -> Result<AnyQueryResult, sqlx::Error>
where
    E: Executor<'c, Database = Any>,
{
    let mut query = sqlx::query(sql);
    for param in params {
        query = param.bind(query);
    }
    query.execute(executor).await
}

/// Resolves connection names to pools
#[derive(Clone)]
pub struct ConnectionResolver {
    configs: Arc<HashMap<String, ConnectionConfig>>,
    default: String,
    cache: Arc<DashMap<String, Connection>>,
}

impl ConnectionResolver {
    pub fn new(configs: HashMap<String, ConnectionConfig>, default: impl Into<String>) -> Self {
        sqlx::any::install_default_drivers();

        Self {
            configs: Arc::new(configs),
            default: default.into(),
            cache: Arc::new(DashMap::new()),
        }
    }

    pub fn from_config(config: &GardenerConfig) -> Self {
        Self::new(config.connections.clone(), config.default_connection.clone())
    }

    /// Name used when no connection is requested
    pub fn default_connection(&self) -> &str {
        &self.default
    }

    /// Make an existing pool available under `name`
    pub fn register(&self, name: impl Into<String>, driver: Driver, pool: AnyPool) {
        let name = name.into();
        self.cache
            .insert(name.clone(), Connection::new(name, driver, pool));
    }

    /// Resolve `name`, or the default connection when `None`
    pub fn connection(&self, name: Option<&str>) -> GardenerResult<Connection> {
        let name = name.unwrap_or(&self.default);

        if let Some(connection) = self.cache.get(name) {
            return Ok(connection.clone());
        }

        let config = self.configs.get(name).ok_or_else(|| {
            GardenerError::storage(format!("Database connection [{}] not configured.", name))
        })?;
        let driver = config.driver()?;

        tracing::debug!(connection = name, driver = %driver, "opening database pool");

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url)
            .map_err(|e| {
                GardenerError::storage(format!(
                    "Failed to create pool for connection [{}]: {}",
                    name, e
                ))
            })?;

        let connection = Connection::new(name, driver, pool);
        self.cache.insert(name.to_string(), connection.clone());
        Ok(connection)
    }
}

impl fmt::Debug for ConnectionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionResolver")
            .field("default", &self.default)
            .field("connections", &self.configs.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_display() {
        assert_eq!(SqlValue::from("O'Brien").to_string(), "'O''Brien'");
        assert_eq!(SqlValue::from(42_i32).to_string(), "42");
        assert_eq!(SqlValue::from(Option::<i64>::None).to_string(), "NULL");
        assert_eq!(SqlValue::from(true).to_string(), "true");
    }

    #[test]
    fn test_unknown_connection_is_storage_error() {
        let resolver = ConnectionResolver::new(HashMap::new(), "default");
        let err = resolver.connection(Some("missing")).unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("[missing]"));
    }

    #[tokio::test]
    async fn test_connections_are_cached_by_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("app.db").display());
        let mut configs = HashMap::new();
        configs.insert("default".to_string(), ConnectionConfig::new(url));

        let resolver = ConnectionResolver::new(configs, "default");
        let first = resolver.connection(None).unwrap();
        let second = resolver.connection(Some("default")).unwrap();

        assert_eq!(first.driver(), Driver::Sqlite);
        assert_eq!(first.name(), second.name());
        assert_eq!(resolver.cache.len(), 1);
    }
}
