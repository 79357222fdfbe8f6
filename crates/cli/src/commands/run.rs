use anyhow::Result;
use gardener::RunOptions;

use super::{prepare_database, Context};
use crate::cli::RunArgs;
use crate::{output, paths};

pub async fn run(ctx: &Context, args: &RunArgs) -> Result<()> {
    if !ctx.gate(args.scope.env.as_deref()).confirm_to_proceed(args.force) {
        return Ok(());
    }

    let mut migrator = ctx.migrator(&args.scope);
    prepare_database(&migrator).await?;

    let options = RunOptions {
        pretend: args.pretend,
    };

    let result = match &args.file {
        Some(file) => {
            let path = paths::seed_file(&ctx.config, file);
            migrator.run_single_file(&path, options).await
        }
        None => {
            let seed_paths = ctx.seed_paths(&args.scope);
            migrator.run(&seed_paths, options).await
        }
    };

    output::notes(migrator.notes());
    result?;
    Ok(())
}
