//! Error types for the seed ledger and migrator
//!
//! Every failure the core can raise is a [`GardenerError`]. Nothing is retried
//! locally; errors propagate to the invoking command, which reports and halts.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gardener operations
pub type GardenerResult<T> = Result<T, GardenerError>;

/// Error types for seed operations
#[derive(Debug, Error)]
pub enum GardenerError {
    /// The ledger table is missing, unreachable or malformed
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// A seed identifier does not map to an executable unit
    #[error("Unable to resolve seed '{identifier}': no seed named '{class}' is registered")]
    Resolution { identifier: String, class: String },

    /// A scaffolded seed would shadow an existing unit
    #[error("A {class} seed already exists.")]
    DuplicateDefinition { class: String },

    /// The seed's own up/down failed
    #[error("Seed '{seed}' failed: {message}")]
    Execution { seed: String, message: String },

    /// A statement issued through a seed context failed
    #[error("Statement failed: {message}")]
    Statement { message: String },

    /// A seed file named on the command line does not exist
    #[error("Seed file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GardenerError {
    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new resolution error
    pub fn resolution(identifier: impl Into<String>, class: impl Into<String>) -> Self {
        Self::Resolution {
            identifier: identifier.into(),
            class: class.into(),
        }
    }

    /// Create a new duplicate definition error
    pub fn duplicate(class: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            class: class.into(),
        }
    }

    /// Wrap the failure of a seed's `up` or `down`
    pub fn execution(seed: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Execution {
            seed: seed.into(),
            message: source.to_string(),
        }
    }

    /// Create a new statement error
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Whether the error came from the ledger store
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

// Ledger queries surface as storage failures; seed statements are mapped explicitly.
impl From<sqlx::Error> for GardenerError {
    fn from(err: sqlx::Error) -> Self {
        GardenerError::storage(err.to_string())
    }
}

impl From<serde_yaml::Error> for GardenerError {
    fn from(err: serde_yaml::Error) -> Self {
        GardenerError::configuration(err.to_string())
    }
}

impl From<tinytemplate::error::Error> for GardenerError {
    fn from(err: tinytemplate::error::Error) -> Self {
        GardenerError::template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GardenerError::resolution("2024_01_01_000000_users", "Users");
        assert_eq!(
            err.to_string(),
            "Unable to resolve seed '2024_01_01_000000_users': no seed named 'Users' is registered"
        );

        let err = GardenerError::duplicate("CreateUsers");
        assert_eq!(err.to_string(), "A CreateUsers seed already exists.");

        let err = GardenerError::execution("2024_01_01_000000_users", GardenerError::statement("boom"));
        assert_eq!(
            err.to_string(),
            "Seed '2024_01_01_000000_users' failed: Statement failed: boom"
        );
    }

    #[test]
    fn test_sqlx_errors_are_storage_errors() {
        let err: GardenerError = sqlx::Error::RowNotFound.into();
        assert!(err.is_storage());
    }
}
