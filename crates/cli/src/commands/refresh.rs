use anyhow::Result;
use gardener::RunOptions;

use super::{prepare_database, Context};
use crate::cli::RefreshArgs;
use crate::output;

/// Roll back every seed of the environment, then run them all again
pub async fn refresh(ctx: &Context, args: &RefreshArgs) -> Result<()> {
    if !ctx.gate(args.scope.env.as_deref()).confirm_to_proceed(args.force) {
        return Ok(());
    }

    let mut migrator = ctx.migrator(&args.scope);
    prepare_database(&migrator).await?;
    let seed_paths = ctx.seed_paths(&args.scope);

    let reset = migrator.reset(&seed_paths, false).await;
    output::notes(migrator.notes());
    reset?;

    let run = migrator.run(&seed_paths, RunOptions::default()).await;
    output::notes(migrator.notes());
    run?;
    Ok(())
}
