//! Application secret used to key policy signatures

use serde::{Deserialize, Deserializer};
use std::fmt;
use zeroize::Zeroizing;

/// Opaque secret bytes, wiped from memory on drop.
///
/// `Debug` never prints the bytes, so a secret can sit inside a logged
/// configuration without leaking.
#[derive(Clone, Default)]
pub struct PolicySecret(Zeroizing<Vec<u8>>);

impl PolicySecret {
    /// Wrap raw secret bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// Borrow the secret bytes for keying a MAC
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Whether the secret has no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PolicySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PolicySecret(<redacted>)")
    }
}

impl From<&str> for PolicySecret {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes())
    }
}

impl From<String> for PolicySecret {
    fn from(secret: String) -> Self {
        Self::new(secret.into_bytes())
    }
}

impl<'de> Deserialize<'de> for PolicySecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
