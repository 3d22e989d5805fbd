use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewProfile, ProfileError, ProfileStore};
use crate::auth::{verify_password, RefreshTokenHash};

struct ProfileRecord {
    login: String,
    password_hash: String,
    refresh_hash: Option<RefreshTokenHash>,
}

/// Process-local profile store for development and tests
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, ProfileRecord>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn create_profile(&self, profile: NewProfile) -> Result<Uuid, ProfileError> {
        let mut profiles = self.profiles.write().await;
        if profiles.values().any(|p| p.login == profile.login) {
            return Err(ProfileError::AlreadyExists);
        }

        let subject_id = Uuid::new_v4();
        profiles.insert(
            subject_id,
            ProfileRecord {
                login: profile.login,
                password_hash: profile.password_hash,
                refresh_hash: None,
            },
        );
        Ok(subject_id)
    }

    async fn login(&self, login: &str, secret: &str) -> Result<Uuid, ProfileError> {
        let profiles = self.profiles.read().await;
        let (subject_id, record) = profiles
            .iter()
            .find(|(_, p)| p.login == login)
            .ok_or(ProfileError::NotFound)?;

        match verify_password(secret, &record.password_hash) {
            Ok(true) => Ok(*subject_id),
            Ok(false) => Err(ProfileError::InvalidCredentials),
            Err(e) => {
                tracing::error!(subject_id = %subject_id, error = %e, "Stored password hash is unusable");
                Err(ProfileError::InvalidCredentials)
            }
        }
    }

    async fn update_refresh_hash(
        &self,
        subject_id: Uuid,
        hash: &RefreshTokenHash,
    ) -> Result<(), ProfileError> {
        let mut profiles = self.profiles.write().await;
        let record = profiles.get_mut(&subject_id).ok_or(ProfileError::NotFound)?;
        record.refresh_hash = Some(hash.clone());
        Ok(())
    }

    async fn get_refresh_hash(
        &self,
        subject_id: Uuid,
    ) -> Result<Option<RefreshTokenHash>, ProfileError> {
        let profiles = self.profiles.read().await;
        profiles
            .get(&subject_id)
            .map(|p| p.refresh_hash.clone())
            .ok_or(ProfileError::NotFound)
    }

    async fn delete_profile(&self, subject_id: Uuid) -> Result<(), ProfileError> {
        self.profiles
            .write()
            .await
            .remove(&subject_id)
            .map(|_| ())
            .ok_or(ProfileError::NotFound)
    }
}
