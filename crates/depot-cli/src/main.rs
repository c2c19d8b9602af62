//! Operator CLI for Depot
//!
//! Issues and verifies signed access policies and renders metadata queries
//! and transform anchors the way the storage client sends them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::policy::{self, SignArgs, VerifyArgs};
use commands::query;

#[derive(Parser)]
#[command(name = "depot")]
#[command(about = "Depot - storage client policy and query tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Security config file (TOML or JSON); DEPOT_POLICY_* variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and sign a policy
    Sign(SignArgs),

    /// Verify a signed policy and print its document
    Verify(VerifyArgs),

    /// Render a metadata field selection as query tokens
    Metadata {
        /// Fields to request (comma-separated, e.g. size,mimetype,sha256)
        fields: String,
    },

    /// Resolve transform anchor positions
    Anchor {
        /// Positions (comma-separated, e.g. top,left)
        positions: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sign(args) => policy::sign(cli.config.as_deref(), &args)?,
        Commands::Verify(args) => policy::verify(cli.config.as_deref(), &args)?,
        Commands::Metadata { fields } => query::metadata(&fields)?,
        Commands::Anchor { positions } => query::anchor(&positions)?,
    }

    Ok(())
}
