use anyhow::Result;
use gardener::RollbackOptions;

use super::Context;
use crate::cli::RollbackArgs;
use crate::output;

pub async fn rollback(ctx: &Context, args: &RollbackArgs) -> Result<()> {
    if !ctx.gate(args.scope.env.as_deref()).confirm_to_proceed(args.force) {
        return Ok(());
    }

    let mut migrator = ctx.migrator(&args.scope);
    if !migrator.repository_exists().await? {
        output::comment("Seed table not found.");
        return Ok(());
    }

    let options = RollbackOptions {
        pretend: args.pretend,
        step: args.step,
    };
    let seed_paths = ctx.seed_paths(&args.scope);
    let result = migrator.rollback(&seed_paths, options).await;

    output::notes(migrator.notes());
    result?;
    Ok(())
}
