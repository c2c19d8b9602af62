//! Depot Security - access policies and their signatures
//!
//! - `PolicyPermission`: the closed universe of grantable calls
//! - `PolicyDocument`: validated, immutable policy with a canonical JSON encoding
//! - `PolicySigner` / `SignedPolicy`: URL-safe base64 + hex HMAC-SHA256 signing
//! - `SecurityConfig` / `PolicyIssuer`: configuration-driven issuance
//!
//! All operations are pure and synchronous. The secret is borrowed for the
//! duration of a single sign or verify call and never logged.

#![forbid(unsafe_code)]

/// Security configuration loading
pub mod config;

/// Configuration-driven policy issuance
pub mod issuer;

/// Grantable policy calls
pub mod permission;

/// Policy documents and canonical encoding
pub mod policy;

/// Signing secret
pub mod secret;

/// HMAC policy signing and verification
pub mod signer;

pub use config::SecurityConfig;
pub use issuer::PolicyIssuer;
pub use permission::PolicyPermission;
pub use policy::{PolicyConstraints, PolicyDocument};
pub use secret::PolicySecret;
pub use signer::{decode_policy, PolicySigner, SignedPolicy};
