//! aide CLI binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use aide::cli::Cli;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_env("AIDE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = aide::cli::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
