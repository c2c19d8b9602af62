//! HMAC-SHA256 policy signing
//!
//! A signed policy is the URL-safe base64 encoding of the document's
//! canonical JSON plus a lowercase hex HMAC-SHA256 of that encoding, keyed by
//! the application secret. Signing is a pure function of (encoding, secret):
//! the signer adds no timestamp, nonce or other hidden input.

use crate::policy::PolicyDocument;
use crate::secret::PolicySecret;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use depot_core::{DecodingError, Result, SigningError};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the encoded policy
pub const POLICY_PARAM: &str = "policy";

/// Query parameter carrying the signature
pub const SIGNATURE_PARAM: &str = "signature";

/// An encoded policy and its signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedPolicy {
    policy_encoding: String,
    signature: String,
}

impl SignedPolicy {
    /// Reassemble a signed policy received from elsewhere; nothing is checked
    pub fn from_parts(policy_encoding: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            policy_encoding: policy_encoding.into(),
            signature: signature.into(),
        }
    }

    /// URL-safe base64 of the canonical document
    pub fn policy_encoding(&self) -> &str {
        &self.policy_encoding
    }

    /// Lowercase hex HMAC-SHA256 of the policy encoding
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// `(name, value)` pairs for a request-signing collaborator
    pub fn query_pairs(&self) -> [(&'static str, &str); 2] {
        [
            (POLICY_PARAM, self.policy_encoding.as_str()),
            (SIGNATURE_PARAM, self.signature.as_str()),
        ]
    }

    /// `policy=<encoding>&signature=<hex>`
    pub fn to_query_string(&self) -> String {
        format!(
            "{POLICY_PARAM}={}&{SIGNATURE_PARAM}={}",
            self.policy_encoding, self.signature
        )
    }

    /// Decode the carried document without checking the signature
    pub fn decode_document(&self) -> std::result::Result<PolicyDocument, DecodingError> {
        decode_policy(&self.policy_encoding)
    }
}

impl fmt::Display for SignedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Decode a URL-safe base64 policy encoding back into a validated document.
///
/// Padded and unpadded encodings are both accepted.
pub fn decode_policy(policy_encoding: &str) -> std::result::Result<PolicyDocument, DecodingError> {
    let bytes = URL_SAFE
        .decode(policy_encoding)
        .or_else(|_| URL_SAFE_NO_PAD.decode(policy_encoding))
        .map_err(|e| DecodingError::malformed(format!("invalid base64url encoding: {e}")))?;
    PolicyDocument::from_canonical(&bytes)
}

/// Signs and verifies policy encodings with HMAC-SHA256
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicySigner;

impl PolicySigner {
    /// Encode `document_encoding` and sign the encoding with `secret`
    pub fn sign(
        document_encoding: &[u8],
        secret: &PolicySecret,
    ) -> std::result::Result<SignedPolicy, SigningError> {
        let policy_encoding = URL_SAFE.encode(document_encoding);
        let signature = hex::encode(mac(&policy_encoding, secret)?);

        tracing::debug!(
            encoded_len = policy_encoding.len(),
            "Signed policy document"
        );

        Ok(SignedPolicy {
            policy_encoding,
            signature,
        })
    }

    /// Sign a built document's canonical encoding
    pub fn sign_document(
        document: &PolicyDocument,
        secret: &PolicySecret,
    ) -> std::result::Result<SignedPolicy, SigningError> {
        Self::sign(document.canonical_encoding(), secret)
    }

    /// Check `signature` against `policy_encoding` under `secret`.
    ///
    /// The encoding must first decode to a valid document, otherwise this
    /// fails with [`DecodingError::MalformedPolicy`]. The signature comparison
    /// runs in constant time over the hex text, so only the exact lowercase
    /// hex digest is accepted.
    pub fn verify(policy_encoding: &str, signature: &str, secret: &PolicySecret) -> Result<bool> {
        let (_, matches) = check(policy_encoding, signature, secret)?;
        Ok(matches)
    }

    /// Verify and return the carried document.
    ///
    /// Fails with [`DecodingError::SignatureMismatch`] when the signature does
    /// not match. Expiry is not checked here.
    pub fn open(
        policy_encoding: &str,
        signature: &str,
        secret: &PolicySecret,
    ) -> Result<PolicyDocument> {
        match check(policy_encoding, signature, secret)? {
            (document, true) => Ok(document),
            (_, false) => Err(DecodingError::SignatureMismatch.into()),
        }
    }
}

// Decode first so a malformed encoding is reported before any signature work
fn check(
    policy_encoding: &str,
    signature: &str,
    secret: &PolicySecret,
) -> Result<(PolicyDocument, bool)> {
    let document = decode_policy(policy_encoding)?;
    let expected = hex::encode(mac(policy_encoding, secret)?);

    let matches = constant_time_eq(expected.as_bytes(), signature.as_bytes());
    if !matches {
        tracing::warn!("Policy signature mismatch");
    }
    Ok((document, matches))
}

fn mac(policy_encoding: &str, secret: &PolicySecret) -> std::result::Result<Vec<u8>, SigningError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.expose()).map_err(|e| SigningError::Primitive {
            message: e.to_string(),
        })?;
    mac.update(policy_encoding.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
