//! # Gardener
//!
//! Versioned, environment-aware data seeding. Seeds are timestamped files
//! run once per environment and recorded in a ledger table, grouped into
//! batches so the last run can be rolled back.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gardener::{GardenerConfig, RunOptions, SeedMigrator, SeedRegistry};
//!
//! # async fn example() -> gardener::GardenerResult<()> {
//! let config = GardenerConfig::from_env();
//! let mut migrator = SeedMigrator::from_config(&config, Arc::new(SeedRegistry::new()));
//! migrator.repository().create_repository().await?;
//! migrator.run(&[config.seeds_path()], RunOptions::default()).await?;
//!
//! for note in migrator.notes() {
//!     println!("{}", note);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod creator;
pub mod dialect;
pub mod error;
pub mod locator;
pub mod migrator;
pub mod naming;
pub mod registry;
pub mod repository;
pub mod seed;
pub mod sql_seed;

pub use config::{ConnectionConfig, GardenerConfig};
pub use connection::{Connection, ConnectionResolver, SqlValue};
pub use creator::{SeedCreator, SeedKind};
pub use dialect::{Dialect, Driver};
pub use error::{GardenerError, GardenerResult};
pub use locator::{SeedFile, SeedFiles, SeedLocator};
pub use migrator::{Note, NoteKind, RollbackOptions, RunOptions, SeedMigrator, SeedStatus};
pub use registry::{SeedFactory, SeedRegistry};
pub use repository::{GardenerRepository, SeedRecord};
pub use seed::{Seed, SeedContext};
pub use sql_seed::SqlSeed;

pub use async_trait::async_trait;
