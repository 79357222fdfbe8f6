//! # gardener-cli
//!
//! The `gardener` command line, usable as a library so applications with
//! Rust seeds can ship the same commands from their own binary:
//!
//! ```rust,no_run
//! use gardener::SeedRegistry;
//! use gardener_cli::Kernel;
//! # #[derive(Default)] struct DefaultRoles;
//! # #[gardener::async_trait]
//! # impl gardener::Seed for DefaultRoles {
//! #     async fn up(&self, _ctx: &mut gardener::SeedContext) -> gardener::GardenerResult<()> { Ok(()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     let registry = SeedRegistry::new().register::<DefaultRoles>("default_roles");
//!     Kernel::new(registry).run().await
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod confirm;
pub mod logging;
pub mod output;
pub mod paths;

use anyhow::{Context as _, Result};
use clap::Parser;
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;

use gardener::config::mask_url;
use gardener::{GardenerConfig, SeedRegistry};

use cli::{Cli, Command};
use commands::Context;

/// Parses arguments and dispatches seed commands
#[derive(Debug, Clone)]
pub struct Kernel {
    registry: Arc<SeedRegistry>,
    config: Option<GardenerConfig>,
    interactive: Option<bool>,
}

impl Kernel {
    pub fn new(registry: SeedRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            config: None,
            interactive: None,
        }
    }

    /// Use this configuration instead of loading `--config` and the environment
    pub fn with_config(mut self, config: GardenerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Force interactive (or non-interactive) confirmation prompts
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    /// Run with the process arguments
    pub async fn run(self) -> ExitCode {
        self.run_from(std::env::args_os()).await
    }

    /// Run with `args`, reporting errors and mapping them to an exit code
    pub async fn run_from<I, T>(self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) => {
                let _ = e.print();
                return ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2));
            }
        };

        logging::init_logging(cli.verbose);

        match self.execute(cli).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                output::error(&e);
                ExitCode::FAILURE
            }
        }
    }

    /// Parse `args` and run the command, returning its error
    pub async fn execute_from<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        self.execute(cli).await
    }

    pub async fn execute(&self, cli: Cli) -> Result<()> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => GardenerConfig::load(&cli.config)
                .with_context(|| format!("failed to load {}", cli.config.display()))?,
        };

        let mut ctx = Context::new(config, Arc::clone(&self.registry));
        ctx.interactive = self.interactive;

        let connection = ctx
            .config
            .connections
            .get(&ctx.config.default_connection)
            .map(|connection| mask_url(&connection.url))
            .unwrap_or_default();
        tracing::debug!(
            environment = %ctx.config.environment,
            table = %ctx.config.table,
            connection = %connection,
            "dispatching command"
        );

        match cli.command {
            Command::Run(args) => commands::run::run(&ctx, &args).await,
            Command::DbSeed { run, class } => {
                if let Some(class) = class {
                    tracing::debug!(class = %class, "--class is ignored, running all outstanding seeds");
                }
                commands::run::run(&ctx, &run).await
            }
            Command::Install { database } => commands::install::install(&ctx, database).await,
            Command::Make(args) => commands::make::make(&ctx, &args).await,
            Command::Reset(args) => commands::reset::reset(&ctx, &args).await,
            Command::Rollback(args) => commands::rollback::rollback(&ctx, &args).await,
            Command::Refresh(args) => commands::refresh::refresh(&ctx, &args).await,
            Command::Status(args) => commands::status::status(&ctx, &args).await,
        }
    }
}
