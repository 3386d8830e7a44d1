//! s3client - Interactive shell for S3-compatible object storage
//!
//! Presents buckets and key prefixes as a navigable directory tree.

use clap::Parser;
use s3client::app::{self, Cli};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with listings on stdout
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = app::run(cli).await;

    std::process::exit(exit_code.as_i32());
}
