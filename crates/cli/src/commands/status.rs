use anyhow::{Context as _, Result};

use super::Context;
use crate::cli::StatusArgs;
use crate::output;

pub async fn status(ctx: &Context, args: &StatusArgs) -> Result<()> {
    let migrator = ctx.migrator(&args.scope);
    if !migrator.repository_exists().await? {
        output::comment("Seed table not found.");
        return Ok(());
    }

    let seed_paths = ctx.seed_paths(&args.scope);
    let statuses = migrator.status(&seed_paths).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&statuses).context("failed to encode seed status")?;
        println!("{}", json);
    } else if statuses.is_empty() {
        output::comment("No seeds found.");
    } else {
        println!("{}", output::status_table(&statuses));
    }
    Ok(())
}
