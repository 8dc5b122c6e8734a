//! envelope-check - validate switchboard envelopes from the command line.
//!
//! Reads envelope JSON (one object or an array of objects per file),
//! validates it with wire semantics, and can derive replies and acks for
//! hand-testing transports and application workers.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod envelopes;
mod output;

use commands::Cli;
use config::{Config, LogFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config);

    match cli.run() {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            output::print_error(&e);
            std::process::exit(2);
        }
    }
}

fn init_tracing(config: &Config) {
    // Prefer RUST_LOG, fall back to SWITCHBOARD_LOG_LEVEL
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
