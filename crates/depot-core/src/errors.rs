//! Unified error system for Depot
//!
//! Every failure is raised synchronously, before anything reaches the
//! network, and names the precondition that failed. Nothing here is
//! transient, so no caller should retry on any of these errors.

use crate::transform::AxisGroup;
use serde::{Deserialize, Serialize};

/// An input precondition failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    /// More than one flag from the same anchor axis group was selected
    #[error("Conflicting {group} anchors: {}", .flags.join(", "))]
    ConflictingAxis {
        /// The group with more than one active flag
        group: AxisGroup,
        /// Tokens of every active flag in that group
        flags: Vec<String>,
    },

    /// A policy that grants no operation
    #[error("Policy permission set is empty")]
    EmptyPermissionSet,

    /// Policy expiry is not strictly after the injected clock's time
    #[error("Policy expiry {expiry} is not after current time {now}")]
    PastExpiry {
        /// Requested expiry, Unix seconds
        expiry: u64,
        /// Time reported by the clock, Unix seconds
        now: u64,
    },

    /// Minimum size bound exceeds the maximum size bound
    #[error("Policy min_size {min_size} exceeds max_size {max_size}")]
    InvertedSizeBounds {
        /// Lower bound, bytes
        min_size: u64,
        /// Upper bound, bytes
        max_size: u64,
    },
}

/// Fatal decoding failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum DecodingError {
    /// An encoded policy does not decode to a valid policy document
    #[error("Malformed policy: {reason}")]
    MalformedPolicy {
        /// What was wrong with the encoding
        reason: String,
    },

    /// An encoded policy decoded correctly but its signature does not match
    #[error("Policy signature does not match")]
    SignatureMismatch,
}

impl DecodingError {
    /// Create a malformed policy error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPolicy {
            reason: reason.into(),
        }
    }
}

/// The underlying cryptographic primitive failed.
///
/// Valid inputs make the primitive infallible, so this signals a programming
/// error rather than a condition to retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SigningError {
    /// The keyed hash rejected its inputs
    #[error("Signing primitive failed: {message}")]
    Primitive {
        /// Error message from the primitive
        message: String,
    },
}

/// Error type for clock reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum TimeError {
    /// The clock could not report a Unix timestamp
    #[error("Clock unavailable: {reason}")]
    Unavailable {
        /// Why the clock failed
        reason: String,
    },
}

/// Configuration loading and validation failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ConfigError {
    /// The configuration source could not be read
    #[error("Failed to read config: {message}")]
    Read {
        /// Error message describing the read failure
        message: String,
    },

    /// The configuration could not be parsed
    #[error("Invalid config format: {message}")]
    Parse {
        /// Error message describing the parse failure
        message: String,
    },

    /// A configuration value is out of range or missing
    #[error("Invalid config field '{field}': {message}")]
    InvalidField {
        /// Dotted name of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },
}

/// Unified error type for all Depot operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum DepotError {
    /// Input validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Decoding failed fatally
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// Signing primitive failed
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Clock read failed
    #[error(transparent)]
    Time(#[from] TimeError),

    /// Configuration failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Canonical serialization failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },
}

impl DepotError {
    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether the caller can fix this by changing its input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Standard Result type for Depot operations
pub type Result<T> = std::result::Result<T, DepotError>;
