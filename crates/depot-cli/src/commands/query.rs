// Metadata query and transform anchor rendering

use super::parse_flags;
use anyhow::Result;
use depot_core::{MetadataField, MetadataQueryEncoder, PositionAxis, TransformAnchor};

pub fn metadata(fields: &str) -> Result<()> {
    let fields = parse_flags::<MetadataField>(fields)?;
    println!("{}", MetadataQueryEncoder::to_query_string(fields));
    Ok(())
}

pub fn anchor(positions: &str) -> Result<()> {
    let flags = parse_flags::<PositionAxis>(positions)?;
    let anchor = TransformAnchor::validate(flags)?;
    println!("{}", anchor.to_param());
    Ok(())
}
