//! Command handlers
//!
//! Each handler prints the migrator's notes once the migrator returns, including
//! after a failure, so the seeds that did run are visible.

pub mod install;
pub mod make;
pub mod refresh;
pub mod reset;
pub mod rollback;
pub mod run;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use gardener::{GardenerConfig, GardenerResult, SeedMigrator, SeedRegistry};

use crate::cli::ScopeArgs;
use crate::confirm::ConfirmGate;
use crate::{output, paths};

/// Shared state handed to every command
#[derive(Debug, Clone)]
pub struct Context {
    pub config: GardenerConfig,
    pub registry: Arc<SeedRegistry>,
    /// `None` detects whether a user is attached to the terminal
    pub interactive: Option<bool>,
}

impl Context {
    pub fn new(config: GardenerConfig, registry: Arc<SeedRegistry>) -> Self {
        Self {
            config,
            registry,
            interactive: None,
        }
    }

    /// Migrator scoped to the requested environment and connection
    pub fn migrator(&self, scope: &ScopeArgs) -> SeedMigrator {
        let mut migrator = SeedMigrator::from_config(&self.config, Arc::clone(&self.registry));
        migrator.set_env(scope.env.clone());
        migrator.set_connection(scope.database.clone());
        migrator
    }

    pub fn seed_paths(&self, scope: &ScopeArgs) -> Vec<PathBuf> {
        paths::seed_paths(&self.config, &scope.path)
    }

    /// Confirmation gate for the requested environment, or the application's
    pub fn gate(&self, env: Option<&str>) -> ConfirmGate {
        let environment = env.unwrap_or(&self.config.environment);
        match self.interactive {
            Some(interactive) => ConfirmGate::with_interactive(environment, interactive),
            None => ConfirmGate::new(environment),
        }
    }
}

/// Create the ledger table when it does not exist yet
pub async fn prepare_database(migrator: &SeedMigrator) -> GardenerResult<()> {
    if !migrator.repository_exists().await? {
        migrator.repository().create_repository().await?;
        output::info("Seed table created successfully.");
    }
    Ok(())
}
