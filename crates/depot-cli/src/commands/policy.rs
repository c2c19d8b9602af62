// Policy signing and verification commands

use super::parse_flags;
use anyhow::{Context, Result};
use clap::Args;
use depot_core::SystemTimeSource;
use depot_security::{PolicyConstraints, PolicyIssuer, PolicyPermission, SecurityConfig};
use std::path::Path;
use tracing::info;

#[derive(Args)]
pub struct SignArgs {
    /// Calls to grant (comma-separated, e.g. read,stat,convert)
    #[arg(long)]
    pub call: String,

    /// Policy lifetime in seconds (overrides config)
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Restrict to a single file handle
    #[arg(long)]
    pub handle: Option<String>,

    /// Source URL pattern for processing transforms
    #[arg(long)]
    pub url: Option<String>,

    /// Minimum stored file size in bytes
    #[arg(long)]
    pub min_size: Option<u64>,

    /// Maximum stored file size in bytes
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Storage path pattern
    #[arg(long)]
    pub path: Option<String>,

    /// Storage container pattern
    #[arg(long)]
    pub container: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// URL-safe base64 policy encoding
    #[arg(long)]
    pub policy: String,

    /// Hex signature
    #[arg(long)]
    pub signature: String,
}

fn issuer(config_path: Option<&Path>, ttl: Option<u64>) -> Result<PolicyIssuer<SystemTimeSource>> {
    let mut config = SecurityConfig::load(config_path).context("loading security config")?;
    if let Some(ttl) = ttl {
        config.policy_ttl_secs = ttl;
    }
    Ok(PolicyIssuer::new(config, SystemTimeSource::new())?)
}

pub fn sign(config_path: Option<&Path>, args: &SignArgs) -> Result<()> {
    let permissions = parse_flags::<PolicyPermission>(&args.call)?;
    let constraints = PolicyConstraints {
        handle: args.handle.clone(),
        url: args.url.clone(),
        min_size: args.min_size,
        max_size: args.max_size,
        path: args.path.clone(),
        container: args.container.clone(),
    };

    let issuer = issuer(config_path, args.ttl)?;
    let signed = issuer.issue(permissions, Some(constraints))?;

    info!(calls = %args.call, "Issued signed policy");
    println!("{signed}");
    Ok(())
}

pub fn verify(config_path: Option<&Path>, args: &VerifyArgs) -> Result<()> {
    let issuer = issuer(config_path, None)?;
    let document = issuer.open(&args.policy, &args.signature)?;

    info!(expiry = document.expiry(), "Policy signature valid");
    println!("{}", String::from_utf8_lossy(document.canonical_encoding()));
    Ok(())
}
