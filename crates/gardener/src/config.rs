//! Gardener configuration
//!
//! Values come from an optional YAML file and are then overridden by
//! environment variables:
//!
//! | Variable              | Field                | Default      |
//! |-----------------------|----------------------|--------------|
//! | `GARDENER_TABLE`      | `table`              | `gardener`   |
//! | `GARDENER_DIRECTORY`  | `directory`          | `gardener`   |
//! | `GARDENER_BASE_PATH`  | `base_path`          | `.`          |
//! | `APP_ENV`             | `environment`        | `production` |
//! | `DB_CONNECTION`       | `default_connection` | `default`    |
//! | `DATABASE_URL`        | default connection URL |            |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dialect::Driver;
use crate::error::{GardenerError, GardenerResult};

pub const DEFAULT_TABLE: &str = "gardener";
pub const DEFAULT_DIRECTORY: &str = "gardener";
pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const DEFAULT_CONNECTION: &str = "default";

/// A named database connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub url: String,
    /// Overrides the driver inferred from the URL scheme
    #[serde(default)]
    pub driver: Option<Driver>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            driver: None,
            max_connections: default_max_connections(),
        }
    }

    /// Driver for this connection, explicit or inferred from the URL
    pub fn driver(&self) -> GardenerResult<Driver> {
        match self.driver {
            Some(driver) => Ok(driver),
            None => Driver::from_url(&self.url).ok_or_else(|| {
                GardenerError::configuration(format!(
                    "Cannot infer database driver from '{}'",
                    mask_url(&self.url)
                ))
            }),
        }
    }
}

/// Seed system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenerConfig {
    /// Ledger table name
    pub table: String,
    /// Seeds directory name under `<base_path>/database`
    pub directory: String,
    /// Application root
    pub base_path: PathBuf,
    /// Application environment used when no environment is given
    pub environment: String,
    pub default_connection: String,
    pub connections: HashMap<String, ConnectionConfig>,
}

impl Default for GardenerConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            directory: DEFAULT_DIRECTORY.to_string(),
            base_path: PathBuf::from("."),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            default_connection: DEFAULT_CONNECTION.to_string(),
            connections: HashMap::new(),
        }
    }
}

impl GardenerConfig {
    /// Configuration from the process environment only
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load `path` if it exists, then apply environment overrides
    pub fn load(path: &Path) -> GardenerResult<Self> {
        let base = if path.exists() {
            Self::from_yaml(&fs::read_to_string(path)?)?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_yaml(content: &str) -> GardenerResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides read through `lookup`
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(table) = lookup("GARDENER_TABLE") {
            self.table = table;
        }
        if let Some(directory) = lookup("GARDENER_DIRECTORY") {
            self.directory = directory;
        }
        if let Some(base_path) = lookup("GARDENER_BASE_PATH") {
            self.base_path = PathBuf::from(base_path);
        }
        if let Some(environment) = lookup("APP_ENV") {
            self.environment = environment;
        }
        if let Some(connection) = lookup("DB_CONNECTION") {
            self.default_connection = connection;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            let name = self.default_connection.clone();
            match self.connections.get_mut(&name) {
                Some(existing) => existing.url = url,
                None => {
                    self.connections.insert(name, ConnectionConfig::new(url));
                }
            }
        }

        self
    }

    /// Register a named connection
    pub fn with_connection(mut self, name: impl Into<String>, connection: ConnectionConfig) -> Self {
        self.connections.insert(name.into(), connection);
        self
    }

    /// `<base_path>/database`
    pub fn database_path(&self) -> PathBuf {
        self.base_path.join("database")
    }

    /// Default seeds directory, `<base_path>/database/<directory>`
    pub fn seeds_path(&self) -> PathBuf {
        self.database_path().join(&self.directory)
    }

    /// Whether the configured environment needs confirmation for destructive commands
    pub fn is_production(&self) -> bool {
        is_production_like(&self.environment)
    }
}

/// Environments where destructive commands require confirmation
pub fn is_production_like(environment: &str) -> bool {
    matches!(
        environment.to_lowercase().as_str(),
        "production" | "prod" | "live"
    )
}

/// Hide the password of a connection URL for display
pub fn mask_url(database_url: &str) -> String {
    url::Url::parse(database_url)
        .map(|mut url| {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        })
        .unwrap_or_else(|_| "***".to_string())
}
