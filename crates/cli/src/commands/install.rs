use anyhow::Result;

use super::Context;
use crate::cli::ScopeArgs;
use crate::output;

pub async fn install(ctx: &Context, database: Option<String>) -> Result<()> {
    let scope = ScopeArgs {
        database,
        ..ScopeArgs::default()
    };
    let migrator = ctx.migrator(&scope);

    migrator.repository().create_repository().await?;
    output::info("Seed table created successfully.");
    Ok(())
}
