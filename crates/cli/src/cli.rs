use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gardener")]
#[command(version, about = "Environment-aware database seeding")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(long, global = true, default_value = "gardener.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seeds the database
    #[command(name = "seed:run")]
    Run(RunArgs),

    /// Seeds the database (alias of seed:run)
    #[command(name = "db:seed")]
    DbSeed {
        #[command(flatten)]
        run: RunArgs,

        /// Accepted for compatibility and ignored
        #[arg(long)]
        class: Option<String>,
    },

    /// Create the seed ledger table
    #[command(name = "seed:install")]
    Install {
        /// The database connection to use
        #[arg(long)]
        database: Option<String>,
    },

    /// Create a new seed file
    #[command(name = "seed:make")]
    Make(MakeArgs),

    /// Roll back every seed of the environment
    #[command(name = "seed:reset")]
    Reset(ResetArgs),

    /// Roll back the last seed batch
    #[command(name = "seed:rollback")]
    Rollback(RollbackArgs),

    /// Reset and re-run every seed
    #[command(name = "seed:refresh")]
    Refresh(RefreshArgs),

    /// Show the status of each seed
    #[command(name = "seed:status")]
    Status(StatusArgs),
}

/// Options selecting the environment, connection and seed directories
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// The environment in which to run the seeds
    #[arg(long)]
    pub env: Option<String>,

    /// The database connection to use
    #[arg(long)]
    pub database: Option<String>,

    /// Seed directories relative to the application root
    #[arg(long)]
    pub path: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Run a single seed file, relative to the seeds directory
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Force the operation to run when in production
    #[arg(long)]
    pub force: bool,

    /// Dump the SQL queries that would be run
    #[arg(long)]
    pub pretend: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MakeArgs {
    /// Seed name, e.g. default_roles
    pub name: String,

    /// Create the seed inside this environment's directory
    #[arg(long)]
    pub env: Option<String>,

    /// Directory relative to the application root
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Scaffold a Rust seed instead of a SQL seed
    #[arg(long)]
    pub rust: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ResetArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    #[arg(long)]
    pub force: bool,

    #[arg(long)]
    pub pretend: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RollbackArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Number of most recent seeds to roll back
    #[arg(long, default_value_t = 0)]
    pub step: usize,

    #[arg(long)]
    pub force: bool,

    #[arg(long)]
    pub pretend: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RefreshArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_repeated_paths() {
        let cli = Cli::try_parse_from([
            "gardener",
            "seed:run",
            "--env",
            "staging",
            "--path",
            "seeds/a",
            "--path",
            "seeds/b",
            "--pretend",
        ])
        .unwrap();

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.scope.env.as_deref(), Some("staging"));
                assert_eq!(args.scope.path.len(), 2);
                assert!(args.pretend);
                assert!(!args.force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_db_seed_accepts_class() {
        let cli = Cli::try_parse_from(["gardener", "db:seed", "--class", "UsersSeeder", "--force"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::DbSeed { ref class, ref run } if class.as_deref() == Some("UsersSeeder") && run.force
        ));
    }

    #[test]
    fn test_rollback_step_defaults_to_zero() {
        let cli = Cli::try_parse_from(["gardener", "seed:rollback"]).unwrap();
        match cli.command {
            Command::Rollback(args) => assert_eq!(args.step, 0),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
