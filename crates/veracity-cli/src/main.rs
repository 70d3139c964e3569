//! Veracity CLI — Verify credentials, presentations, and tokens.
//!
//! Subcommands: init, verify, resolve, decode.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::CliConfig;

/// Veracity — W3C Verifiable Credential verifier.
#[derive(Parser, Debug)]
#[command(name = "veracity", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "veracity.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Override the log format (text, json).
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Verify a credential, presentation, or token.
    Verify(commands::verify::VerifyArgs),
    /// Resolve a DID or dereference a DID URL.
    Resolve(commands::resolve::ResolveArgs),
    /// Decode a JWT without verifying it.
    Decode(commands::decode::DecodeArgs),
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(&cli.config)?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    init_tracing(&config.logging.level, &config.logging.format);

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Verify(args) => commands::verify::run(args, config).await,
        Commands::Resolve(args) => commands::resolve::run(args, &config).await,
        Commands::Decode(args) => commands::decode::run(args),
    }
}
