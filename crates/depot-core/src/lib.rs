//! Depot Core - closed flag sets for the storage client
//!
//! This crate holds the pure value types shared by the Depot client:
//!
//! - `FlagSet<T>`: a closed bit-flag container over one declared universe
//! - `MetadataField` + `MetadataQueryEncoder`: metadata selection as `key=true` tokens
//! - `PositionAxis` + `TransformAnchor`: validated crop/overlay anchors
//! - `TimeSource`: the injectable clock used for expiry checks
//! - The unified `DepotError` taxonomy
//!
//! Nothing here performs I/O or holds shared mutable state; every value can
//! be sent across threads freely.

#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Closed bit-flag sets
pub mod flags;

/// Metadata field selection and query encoding
pub mod metadata;

/// Injectable clocks
pub mod time;

/// Transform anchor positions
pub mod transform;

pub use errors::{
    ConfigError, DecodingError, DepotError, Result, SigningError, TimeError, ValidationError,
};
pub use flags::{Flag, FlagSet, UnknownBitWarning};
pub use metadata::{MetadataField, MetadataQueryEncoder};
pub use time::{FixedTimeSource, SimulatedTimeSource, SystemTimeSource, TimeSource};
pub use transform::{resolve as resolve_anchor, AxisGroup, PositionAxis, TransformAnchor};
