// Command handlers for the depot CLI

pub mod policy;
pub mod query;

use anyhow::{anyhow, Result};
use depot_core::{Flag, FlagSet};

/// Parse a comma-separated list of wire tokens into a flag set
pub fn parse_flags<T: Flag>(list: &str) -> Result<FlagSet<T>> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            T::from_token(token).ok_or_else(|| {
                let known: Vec<&str> = T::ORDER.iter().map(|flag| flag.token()).collect();
                anyhow!(
                    "unknown {} '{token}' (expected one of: {})",
                    T::UNIVERSE_NAME,
                    known.join(", ")
                )
            })
        })
        .collect()
}
