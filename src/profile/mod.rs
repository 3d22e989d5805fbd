/// Profile Store Adapter
///
/// Narrow contract to the external profile service: it owns logins,
/// password hashes, and the single stored refresh-token digest per subject.

mod client;
mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::RefreshTokenHash;

pub use client::HttpProfileClient;
pub use memory::InMemoryProfileStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Login is already taken")]
    AlreadyExists,
    #[error("Profile service unavailable: {0}")]
    Unavailable(String),
}

/// Profile to be created; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub login: String,
    pub password_hash: String,
    pub username: String,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Create a profile and return its newly assigned subject id
    async fn create_profile(&self, profile: NewProfile) -> Result<Uuid, ProfileError>;

    /// Check a login/secret pair; the store compares against its own hash
    async fn login(&self, login: &str, secret: &str) -> Result<Uuid, ProfileError>;

    /// Overwrite the stored refresh digest (last write wins)
    async fn update_refresh_hash(
        &self,
        subject_id: Uuid,
        hash: &RefreshTokenHash,
    ) -> Result<(), ProfileError>;

    /// `Ok(None)` means the profile exists but holds no session
    async fn get_refresh_hash(
        &self,
        subject_id: Uuid,
    ) -> Result<Option<RefreshTokenHash>, ProfileError>;

    async fn delete_profile(&self, subject_id: Uuid) -> Result<(), ProfileError>;
}
