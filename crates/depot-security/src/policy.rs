//! Policy documents
//!
//! A [`PolicyDocument`] is a time-bounded grant of operations over stored
//! files. It is validated and frozen at build time and carries its own
//! canonical encoding: compact JSON with keys in sorted order and the granted
//! calls as an alphabetically sorted array. Two documents built from the
//! same permissions, expiry and constraints always encode to the same bytes,
//! whatever order the permissions were supplied in.

use crate::permission::PolicyPermission;
use depot_core::{
    DecodingError, DepotError, Flag, FlagSet, Result, TimeError, TimeSource, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Optional scoping constraints narrowing what a policy grants
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConstraints {
    /// The single file handle the policy applies to
    pub handle: Option<String>,
    /// Regular expression source URLs must match for processing transforms
    pub url: Option<String>,
    /// Smallest file size in bytes that may be stored
    pub min_size: Option<u64>,
    /// Largest file size in bytes that may be stored
    pub max_size: Option<u64>,
    /// Regular expression the storage path must match
    pub path: Option<String>,
    /// Regular expression the storage container must match
    pub container: Option<String>,
}

impl PolicyConstraints {
    /// No constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one file handle
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Restrict processing sources to URLs matching `pattern`
    pub fn with_url(mut self, pattern: impl Into<String>) -> Self {
        self.url = Some(pattern.into());
        self
    }

    /// Bound stored file sizes, in bytes
    pub fn with_size_bounds(mut self, min_size: Option<u64>, max_size: Option<u64>) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Restrict storage paths to `pattern`
    pub fn with_path(mut self, pattern: impl Into<String>) -> Self {
        self.path = Some(pattern.into());
        self
    }

    /// Restrict storage containers to `pattern`
    pub fn with_container(mut self, pattern: impl Into<String>) -> Self {
        self.container = Some(pattern.into());
        self
    }

    /// Whether no constraint is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill every unset constraint from `base`; constraints set here win
    #[must_use]
    pub fn merged_over(self, base: &PolicyConstraints) -> Self {
        Self {
            handle: self.handle.or_else(|| base.handle.clone()),
            url: self.url.or_else(|| base.url.clone()),
            min_size: self.min_size.or(base.min_size),
            max_size: self.max_size.or(base.max_size),
            path: self.path.or_else(|| base.path.clone()),
            container: self.container.or_else(|| base.container.clone()),
        }
    }

    fn check_size_bounds(&self) -> std::result::Result<(), ValidationError> {
        match (self.min_size, self.max_size) {
            (Some(min_size), Some(max_size)) if min_size > max_size => {
                Err(ValidationError::InvertedSizeBounds { min_size, max_size })
            }
            _ => Ok(()),
        }
    }
}

// Field declaration order is the canonical key order; keep it sorted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyWire {
    call: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    container: Option<String>,
    expiry: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

/// An immutable, validated policy with its canonical encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    permissions: FlagSet<PolicyPermission>,
    expiry: u64,
    constraints: PolicyConstraints,
    canonical: Vec<u8>,
}

impl PolicyDocument {
    /// Validate and freeze a policy.
    ///
    /// Checks run in this order, before anything can reach the network:
    /// an empty permission set fails with
    /// [`ValidationError::EmptyPermissionSet`] regardless of expiry; an
    /// `expiry` not strictly after `clock` fails with
    /// [`ValidationError::PastExpiry`]; inverted size bounds fail with
    /// [`ValidationError::InvertedSizeBounds`].
    pub fn build(
        permissions: FlagSet<PolicyPermission>,
        expiry: u64,
        constraints: Option<PolicyConstraints>,
        clock: &dyn TimeSource,
    ) -> Result<Self> {
        if permissions.is_empty() {
            return Err(ValidationError::EmptyPermissionSet.into());
        }

        let now = clock.current_timestamp()?;
        if expiry <= now {
            return Err(ValidationError::PastExpiry { expiry, now }.into());
        }

        let constraints = constraints.unwrap_or_default();
        constraints.check_size_bounds()?;

        let document = Self::assemble(permissions, expiry, constraints)?;
        tracing::debug!(
            calls = ?document.call_tokens(),
            expiry,
            "Built policy document"
        );
        Ok(document)
    }

    fn assemble(
        permissions: FlagSet<PolicyPermission>,
        expiry: u64,
        constraints: PolicyConstraints,
    ) -> Result<Self> {
        let wire = PolicyWire {
            call: sorted_call_tokens(permissions)
                .into_iter()
                .map(str::to_string)
                .collect(),
            container: constraints.container.clone(),
            expiry,
            handle: constraints.handle.clone(),
            max_size: constraints.max_size,
            min_size: constraints.min_size,
            path: constraints.path.clone(),
            url: constraints.url.clone(),
        };
        let canonical =
            serde_json::to_vec(&wire).map_err(|e| DepotError::serialization(e.to_string()))?;

        Ok(Self {
            permissions,
            expiry,
            constraints,
            canonical,
        })
    }

    /// Parse and re-validate a document from its JSON encoding.
    ///
    /// Used on externally supplied policies, so no clock is consulted: an
    /// expired but well-formed document still parses. Any schema violation
    /// (missing expiry, unknown keys, an empty or unknown call, inverted size
    /// bounds) is a [`DecodingError::MalformedPolicy`], as is valid JSON that
    /// differs from the canonical encoding (key order, call order, spacing,
    /// duplicate calls).
    pub fn from_canonical(bytes: &[u8]) -> std::result::Result<Self, DecodingError> {
        let wire: PolicyWire = serde_json::from_slice(bytes)
            .map_err(|e| DecodingError::malformed(format!("invalid policy JSON: {e}")))?;

        if wire.call.is_empty() {
            return Err(DecodingError::malformed("policy grants no call"));
        }

        let mut permissions = FlagSet::empty();
        for token in &wire.call {
            let permission = PolicyPermission::from_token(token)
                .ok_or_else(|| DecodingError::malformed(format!("unknown call '{token}'")))?;
            permissions = permissions.with(permission);
        }

        let constraints = PolicyConstraints {
            handle: wire.handle,
            url: wire.url,
            min_size: wire.min_size,
            max_size: wire.max_size,
            path: wire.path,
            container: wire.container,
        };
        constraints
            .check_size_bounds()
            .map_err(|e| DecodingError::malformed(e.to_string()))?;

        let document = Self::assemble(permissions, wire.expiry, constraints)
            .map_err(|e| DecodingError::malformed(e.to_string()))?;

        // The signature covers these exact bytes, so they must be canonical
        if document.canonical != bytes {
            return Err(DecodingError::malformed("policy is not in canonical form"));
        }
        Ok(document)
    }

    /// Granted operations
    pub fn permissions(&self) -> FlagSet<PolicyPermission> {
        self.permissions
    }

    /// Expiry, Unix seconds
    pub fn expiry(&self) -> u64 {
        self.expiry
    }

    /// Scoping constraints; empty when none were supplied
    pub fn constraints(&self) -> &PolicyConstraints {
        &self.constraints
    }

    /// Granted calls as tokens, sorted alphabetically
    pub fn call_tokens(&self) -> Vec<&'static str> {
        sorted_call_tokens(self.permissions)
    }

    /// Canonical JSON bytes, the input to signing
    pub fn canonical_encoding(&self) -> &[u8] {
        &self.canonical
    }

    /// Whether the policy has expired according to `clock`
    pub fn is_expired(&self, clock: &dyn TimeSource) -> std::result::Result<bool, TimeError> {
        Ok(self.expiry <= clock.current_timestamp()?)
    }
}

fn sorted_call_tokens(permissions: FlagSet<PolicyPermission>) -> Vec<&'static str> {
    let mut tokens = permissions.tokens();
    tokens.sort_unstable();
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use depot_core::FixedTimeSource;

    const NOW: u64 = 1_700_000_000;

    fn clock() -> FixedTimeSource {
        FixedTimeSource(NOW)
    }

    #[test]
    fn test_minimal_document_encoding() {
        let doc = PolicyDocument::build(
            FlagSet::from(PolicyPermission::Read),
            NOW + 60,
            None,
            &clock(),
        )
        .unwrap();

        assert_eq!(
            doc.canonical_encoding(),
            br#"{"call":["read"],"expiry":1700000060}"#
        );
        assert!(doc.constraints().is_empty());
    }

    #[test]
    fn test_full_document_keys_sorted() {
        let constraints = PolicyConstraints::new()
            .with_handle("SOME-HANDLE")
            .with_url("https://some-url.tld")
            .with_size_bounds(Some(1024), Some(10 * 1024))
            .with_path("SOME-PATH")
            .with_container("SOME-CONTAINER");
        let permissions = FlagSet::from_flags([
            PolicyPermission::Read,
            PolicyPermission::Stat,
            PolicyPermission::Write,
            PolicyPermission::Convert,
        ]);

        let doc = PolicyDocument::build(permissions, NOW + 1, Some(constraints), &clock()).unwrap();

        let expected = concat!(
            r#"{"call":["convert","read","stat","write"],"#,
            r#""container":"SOME-CONTAINER","expiry":1700000001,"handle":"SOME-HANDLE","#,
            r#""max_size":10240,"min_size":1024,"path":"SOME-PATH","url":"https://some-url.tld"}"#
        );
        assert_eq!(doc.canonical_encoding(), expected.as_bytes());
    }

    #[test]
    fn test_calls_sorted_alphabetically() {
        let doc = PolicyDocument::build(FlagSet::all(), NOW + 1, None, &clock()).unwrap();
        assert_eq!(
            doc.call_tokens(),
            vec![
                "convert",
                "exif",
                "pick",
                "read",
                "remove",
                "runWorkflow",
                "stat",
                "store",
                "write",
                "writeUrl"
            ]
        );
    }

    #[test]
    fn test_expiry_equal_to_now_rejected() {
        let result = PolicyDocument::build(FlagSet::from(PolicyPermission::Read), NOW, None, &clock());
        assert_matches!(
            result,
            Err(DepotError::Validation(ValidationError::PastExpiry { expiry: NOW, now: NOW }))
        );
    }

    #[test]
    fn test_empty_checked_before_expiry() {
        let result = PolicyDocument::build(FlagSet::empty(), 0, None, &clock());
        assert_matches!(
            result,
            Err(DepotError::Validation(ValidationError::EmptyPermissionSet))
        );
    }

    #[test]
    fn test_inverted_size_bounds_rejected() {
        let constraints = PolicyConstraints::new().with_size_bounds(Some(10), Some(5));
        let result = PolicyDocument::build(
            FlagSet::from(PolicyPermission::Store),
            NOW + 1,
            Some(constraints),
            &clock(),
        );
        assert_matches!(
            result,
            Err(DepotError::Validation(ValidationError::InvertedSizeBounds {
                min_size: 10,
                max_size: 5
            }))
        );
    }

    #[test]
    fn test_from_canonical_round_trip() {
        let constraints = PolicyConstraints::new().with_handle("h").with_path("/uploads/.*");
        let doc = PolicyDocument::build(
            FlagSet::from_flags([PolicyPermission::Pick, PolicyPermission::Store]),
            NOW + 3600,
            Some(constraints),
            &clock(),
        )
        .unwrap();

        let parsed = PolicyDocument::from_canonical(doc.canonical_encoding()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_from_canonical_rejects_schema_violations() {
        let cases: [&[u8]; 6] = [
            b"not json",
            br#"{"call":["read"]}"#,
            br#"{"call":[],"expiry":5}"#,
            br#"{"call":["teleport"],"expiry":5}"#,
            br#"{"call":["read"],"expiry":5,"owner":"me"}"#,
            br#"{"call":["read"],"expiry":5,"min_size":9,"max_size":1}"#,
        ];
        for case in cases {
            assert_matches!(
                PolicyDocument::from_canonical(case),
                Err(DecodingError::MalformedPolicy { .. })
            );
        }
    }

    #[test]
    fn test_from_canonical_rejects_non_canonical_json() {
        let cases: [&[u8]; 4] = [
            br#"{"call":["stat","read"],"expiry":99999999999}"#,
            br#"{"expiry":99999999999,"call":["read","stat"]}"#,
            br#"{"call": ["read","stat"], "expiry": 99999999999}"#,
            br#"{"call":["read","read","stat"],"expiry":99999999999}"#,
        ];
        for case in cases {
            assert_matches!(
                PolicyDocument::from_canonical(case),
                Err(DecodingError::MalformedPolicy { reason }) if reason.contains("canonical")
            );
        }

        let canonical = br#"{"call":["read","stat"],"expiry":99999999999}"#;
        let doc = PolicyDocument::from_canonical(canonical).unwrap();
        assert_eq!(doc.canonical_encoding(), canonical);
    }

    #[test]
    fn test_is_expired() {
        let doc = PolicyDocument::build(FlagSet::from(PolicyPermission::Read), NOW + 10, None, &clock())
            .unwrap();
        assert_eq!(doc.is_expired(&clock()), Ok(false));
        assert_eq!(doc.is_expired(&FixedTimeSource(NOW + 10)), Ok(true));
    }

    #[test]
    fn test_merged_over_prefers_explicit() {
        let base = PolicyConstraints::new().with_path("base/.*").with_container("bucket");
        let merged = PolicyConstraints::new().with_path("own/.*").merged_over(&base);
        assert_eq!(merged.path.as_deref(), Some("own/.*"));
        assert_eq!(merged.container.as_deref(), Some("bucket"));
    }
}
