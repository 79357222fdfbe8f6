use anyhow::Result;
use gardener::{SeedCreator, SeedKind};
use std::sync::Arc;

use super::Context;
use crate::cli::MakeArgs;
use crate::{output, paths};

pub async fn make(ctx: &Context, args: &MakeArgs) -> Result<()> {
    let root = match &args.path {
        Some(path) => paths::from_base(&ctx.config, path),
        None => ctx.config.seeds_path(),
    };

    let kind = if args.rust { SeedKind::Rust } else { SeedKind::Sql };
    let creator = SeedCreator::new(Arc::clone(&ctx.registry));
    let path = creator.create(&args.name, &root, args.env.as_deref(), kind)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    output::info(&format!("Created Seed: {}", file_name));

    if kind == SeedKind::Rust {
        output::comment("Register the new seed in your application's SeedRegistry before running it.");
    }
    Ok(())
}
