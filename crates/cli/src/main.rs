use std::process::ExitCode;

use gardener::SeedRegistry;
use gardener_cli::Kernel;

#[tokio::main]
async fn main() -> ExitCode {
    // The stock binary only knows SQL seeds; applications with Rust seeds
    // build their own binary around `Kernel` with a populated registry.
    Kernel::new(SeedRegistry::new()).run().await
}
