//! Policy issuance from configuration
//!
//! [`PolicyIssuer`] ties a [`SecurityConfig`] to a clock: expiry is the
//! clock's time plus the configured lifetime, configured default constraints
//! fill whatever the caller leaves unset, and the result comes back signed.

use crate::config::SecurityConfig;
use crate::permission::PolicyPermission;
use crate::policy::{PolicyConstraints, PolicyDocument};
use crate::signer::{PolicySigner, SignedPolicy};
use depot_core::{FlagSet, Result, TimeSource, ValidationError};

/// Issues and checks signed policies for one application secret
#[derive(Debug, Clone)]
pub struct PolicyIssuer<C> {
    config: SecurityConfig,
    clock: C,
}

impl<C: TimeSource> PolicyIssuer<C> {
    /// Create an issuer over a validated configuration
    pub fn new(config: SecurityConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    /// The configuration this issuer signs with
    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Build a policy expiring one lifetime from now
    pub fn build(
        &self,
        permissions: FlagSet<PolicyPermission>,
        constraints: Option<PolicyConstraints>,
    ) -> Result<PolicyDocument> {
        let now = self.clock.current_timestamp()?;
        let expiry = now.saturating_add(self.config.policy_ttl_secs);
        let constraints = constraints
            .unwrap_or_default()
            .merged_over(&self.config.default_constraints);

        PolicyDocument::build(permissions, expiry, Some(constraints), &self.clock)
    }

    /// Build and sign a policy expiring one lifetime from now
    pub fn issue(
        &self,
        permissions: FlagSet<PolicyPermission>,
        constraints: Option<PolicyConstraints>,
    ) -> Result<SignedPolicy> {
        let document = self.build(permissions, constraints)?;
        Ok(PolicySigner::sign_document(&document, &self.config.secret)?)
    }

    /// Check a signature under this issuer's secret
    pub fn verify(&self, policy_encoding: &str, signature: &str) -> Result<bool> {
        PolicySigner::verify(policy_encoding, signature, &self.config.secret)
    }

    /// Verify a signed policy and reject it if it has expired
    pub fn open(&self, policy_encoding: &str, signature: &str) -> Result<PolicyDocument> {
        let document = PolicySigner::open(policy_encoding, signature, &self.config.secret)?;
        let now = self.clock.current_timestamp()?;
        if document.expiry() <= now {
            return Err(ValidationError::PastExpiry {
                expiry: document.expiry(),
                now,
            }
            .into());
        }
        Ok(document)
    }
}
