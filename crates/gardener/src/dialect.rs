//! Driver-specific SQL
//!
//! Each supported driver family has one [`Dialect`] entry supplying the exact
//! statement templates the ledger and the maintenance helpers need. Templates
//! use `{table}` and `{start}` placeholders. A missing template means the
//! operation is a no-op for that driver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GardenerError;

/// Database driver families
///
/// Connections go through the `sqlx` Any driver, which has no SQL Server
/// backend. [`Driver::SqlServer`] is only reached with an explicit `driver:`
/// override on a connection whose URL another backend can open; it selects
/// the SQL Server statement templates, identity-insert helpers included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
}

impl Driver {
    /// Infer the driver from a connection URL scheme
    pub fn from_url(database_url: &str) -> Option<Self> {
        let scheme = match url::Url::parse(database_url) {
            Ok(url) => url.scheme().to_string(),
            Err(_) => database_url.split(':').next()?.to_string(),
        };
        scheme.parse().ok()
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::MySql => "mysql",
            Driver::Sqlite => "sqlite",
            Driver::SqlServer => "sqlserver",
        }
    }

    /// Statement templates for this driver
    pub fn dialect(&self) -> &'static Dialect {
        DIALECTS
            .iter()
            .find(|dialect| dialect.driver == *self)
            .unwrap_or(&DIALECTS[0])
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = GardenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" | "pg" => Ok(Driver::Postgres),
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "sqlserver" | "sqlsrv" | "mssql" => Ok(Driver::SqlServer),
            other => Err(GardenerError::configuration(format!(
                "Unsupported database driver '{}'",
                other
            ))),
        }
    }
}

/// How bound parameters are written in SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `$1`, `$2`, ...
    Numbered,
    /// `?`
    Question,
    /// `@p1`, `@p2`, ...
    Named,
}

/// Statement templates for one driver family
#[derive(Debug)]
pub struct Dialect {
    pub driver: Driver,
    pub placeholder: Placeholder,
    /// Idempotent creation of the ledger table
    pub create_ledger: &'static str,
    /// Counts tables named by the first bound parameter
    pub table_exists: &'static str,
    pub identity_insert_on: Option<&'static str>,
    pub identity_insert_off: Option<&'static str>,
    pub reseed: Option<&'static str>,
    /// Row limit appended after `ORDER BY`
    pub limit: &'static str,
}

static DIALECTS: &[Dialect] = &[
    Dialect {
        driver: Driver::Postgres,
        placeholder: Placeholder::Numbered,
        create_ledger: "CREATE TABLE IF NOT EXISTS {table} (\n    \
            id SERIAL PRIMARY KEY,\n    \
            seed VARCHAR(255) NOT NULL,\n    \
            env VARCHAR(255) NOT NULL,\n    \
            batch INTEGER NOT NULL\n\
        )",
        table_exists: "SELECT COUNT(*) FROM information_schema.tables \
            WHERE table_schema = current_schema() AND table_name = $1",
        identity_insert_on: None,
        identity_insert_off: None,
        reseed: None,
        limit: "LIMIT {count}",
    },
    Dialect {
        driver: Driver::MySql,
        placeholder: Placeholder::Question,
        create_ledger: "CREATE TABLE IF NOT EXISTS {table} (\n    \
            id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,\n    \
            seed VARCHAR(255) NOT NULL,\n    \
            env VARCHAR(255) NOT NULL,\n    \
            batch INT NOT NULL\n\
        )",
        table_exists: "SELECT COUNT(*) FROM information_schema.tables \
            WHERE table_schema = DATABASE() AND table_name = ?",
        identity_insert_on: None,
        identity_insert_off: None,
        reseed: Some("ALTER TABLE {table} AUTO_INCREMENT = {start}"),
        limit: "LIMIT {count}",
    },
    Dialect {
        driver: Driver::Sqlite,
        placeholder: Placeholder::Question,
        create_ledger: "CREATE TABLE IF NOT EXISTS {table} (\n    \
            id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
            seed VARCHAR(255) NOT NULL,\n    \
            env VARCHAR(255) NOT NULL,\n    \
            batch INTEGER NOT NULL\n\
        )",
        table_exists: "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        identity_insert_on: None,
        identity_insert_off: None,
        reseed: None,
        limit: "LIMIT {count}",
    },
    Dialect {
        driver: Driver::SqlServer,
        placeholder: Placeholder::Named,
        create_ledger: "IF OBJECT_ID(N'{table}', N'U') IS NULL CREATE TABLE {table} (\n    \
            id INT IDENTITY(1,1) PRIMARY KEY,\n    \
            seed NVARCHAR(255) NOT NULL,\n    \
            env NVARCHAR(255) NOT NULL,\n    \
            batch INT NOT NULL\n\
        )",
        table_exists: "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = @p1",
        identity_insert_on: Some("SET IDENTITY_INSERT {table} ON"),
        identity_insert_off: Some("SET IDENTITY_INSERT {table} OFF"),
        reseed: Some("DBCC CHECKIDENT ({table}, RESEED, {start})"),
        limit: "OFFSET 0 ROWS FETCH NEXT {count} ROWS ONLY",
    },
];

impl Dialect {
    /// Placeholder for the 1-based parameter `index`
    pub fn param(&self, index: usize) -> String {
        match self.placeholder {
            Placeholder::Numbered => format!("${}", index),
            Placeholder::Question => "?".to_string(),
            Placeholder::Named => format!("@p{}", index),
        }
    }

    /// SQL creating the ledger table
    pub fn create_ledger_sql(&self, table: &str) -> String {
        self.create_ledger.replace("{table}", table)
    }

    pub fn identity_insert_sql(&self, table: &str, enabled: bool) -> Option<String> {
        let template = if enabled {
            self.identity_insert_on
        } else {
            self.identity_insert_off
        };
        template.map(|t| t.replace("{table}", table))
    }

    /// Clause keeping the first `count` ordered rows
    pub fn limit_sql(&self, count: usize) -> String {
        self.limit.replace("{count}", &count.to_string())
    }

    pub fn reseed_sql(&self, table: &str, start: i64) -> Option<String> {
        self.reseed.map(|t| {
            t.replace("{table}", table)
                .replace("{start}", &start.to_string())
        })
    }
}
