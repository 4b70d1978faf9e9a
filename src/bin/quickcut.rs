//! quickcut CLI tool
//!
//! Strips image backgrounds through remove.bg or a local brightness filter
//! and resizes the result.

#[cfg(feature = "cli")]
use quickcut::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
