use anyhow::Result;

use super::{prepare_database, Context};
use crate::cli::ResetArgs;
use crate::output;

pub async fn reset(ctx: &Context, args: &ResetArgs) -> Result<()> {
    if !ctx.gate(args.scope.env.as_deref()).confirm_to_proceed(args.force) {
        return Ok(());
    }

    let mut migrator = ctx.migrator(&args.scope);
    prepare_database(&migrator).await?;

    let seed_paths = ctx.seed_paths(&args.scope);
    let result = migrator.reset(&seed_paths, args.pretend).await;

    output::notes(migrator.notes());
    result?;
    Ok(())
}
