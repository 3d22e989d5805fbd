/// Token claims
///
/// Typed payload carried by both access and refresh tokens. The subject
/// identifier travels in `jti`, alongside the issue and expiry timestamps.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

const NONCE_LENGTH: usize = 16;

/// Which half of a session pair a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject identifier (UUID string)
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub kind: TokenKind,
    /// Random per-token value; keeps two tokens minted in the same second distinct
    pub nonce: String,
}

impl TokenClaims {
    /// Build claims for `subject_id` valid from `issued_at` for `ttl_seconds`
    pub fn new(subject_id: Uuid, kind: TokenKind, issued_at: i64, ttl_seconds: i64) -> Self {
        Self {
            jti: subject_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_seconds),
            kind,
            nonce: generate_nonce(),
        }
    }

    /// Extract the subject identifier
    ///
    /// # Errors
    /// Returns `Malformed` if `jti` is not a valid UUID
    pub fn subject_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.jti)
            .map_err(|_| AuthError::Malformed("token id is not a valid subject id".to_string()))
    }

    /// A token is dead from the second its expiry is reached
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

fn generate_nonce() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}
