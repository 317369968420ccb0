//! Manifest digitizer
//!
//! Converts legacy vessel waste-disposal manifests (a CSV export of the
//! physical inspection logs) into compliance and waste records on the
//! compliance backend.

mod api;
mod cli;
mod config;
mod entities;
mod import;
mod manifest;
mod normalize;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    dotenvy::dotenv().ok();
    init_logging(args.verbose);

    cli::run(args).await
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();
}
