//! Binary crate for the `comicwx` service.
//!
//! This crate focuses on:
//! - The HTTP endpoint layer
//! - Parsing CLI arguments and interactive configuration
//! - Logging setup

use clap::Parser;

mod cli;
mod error;
mod routes;
mod state;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let cmd = cli::Cli::parse();
    cmd.run().await
}
