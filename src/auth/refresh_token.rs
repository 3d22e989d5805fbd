/// Refresh Token Hashing
///
/// Only a SHA-256 digest of a refresh token ever reaches the profile store.
/// A presented token is live only if its digest equals the stored one
/// byte-for-byte.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-256 digest of a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshTokenHash(String);

impl RefreshTokenHash {
    /// Wrap a digest read back from storage
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Constant-time comparison of two digests
    pub fn matches(&self, other: &RefreshTokenHash) -> bool {
        self.as_bytes().ct_eq(other.as_bytes()).into()
    }
}

/// Hash a refresh token using SHA-256
pub fn hash_refresh_token(token: &str) -> RefreshTokenHash {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    RefreshTokenHash(format!("{:x}", hasher.finalize()))
}
