/// Session Service
///
/// Login, refresh-token rotation, sign-up and profile deletion on top of the
/// token codec and the profile store. Holds no mutable state of its own; the
/// only shared value is the per-subject refresh digest kept by the store.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::{hash_password, hash_refresh_token, TokenCodec, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::profile::{NewProfile, ProfileError, ProfileStore};

/// An access/refresh pair issued to one subject
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    pub subject_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionService {
    codec: TokenCodec,
    profiles: Arc<dyn ProfileStore>,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl SessionService {
    pub fn new(codec: TokenCodec, profiles: Arc<dyn ProfileStore>, config: &JwtSettings) -> Self {
        Self {
            codec,
            profiles,
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Hash the secret and create a profile
    ///
    /// # Errors
    /// - 400 validation error for an empty login/username or a bad password
    /// - `Conflict` if the login is taken
    pub async fn sign_up(
        &self,
        login: &str,
        secret: &str,
        username: &str,
    ) -> Result<Uuid, AppError> {
        if login.trim().is_empty() {
            return Err(ValidationError::EmptyField("login".to_string()).into());
        }
        if username.trim().is_empty() {
            return Err(ValidationError::EmptyField("username".to_string()).into());
        }

        let password_hash = hash_password(secret)?;

        let subject_id = self
            .profiles
            .create_profile(NewProfile {
                login: login.to_string(),
                password_hash,
                username: username.to_string(),
            })
            .await
            .map_err(|e| match e {
                ProfileError::AlreadyExists => {
                    AppError::Conflict("Login is already taken".to_string())
                }
                ProfileError::Unavailable(msg) => AppError::Unavailable(msg),
                other => AppError::Internal(format!("Profile creation failed: {}", other)),
            })?;

        tracing::info!(subject_id = %subject_id, "Profile created");
        Ok(subject_id)
    }

    /// Verify credentials and issue a fresh pair
    ///
    /// The pair is only returned once its refresh digest is stored.
    ///
    /// # Errors
    /// - `AuthenticationFailed` for any credential or profile-service failure
    /// - `PersistenceFailed` if the refresh digest cannot be stored
    pub async fn login(&self, login: &str, secret: &str) -> Result<SessionTokens, AppError> {
        if login.is_empty() || secret.is_empty() {
            return Err(AuthError::AuthenticationFailed.into());
        }

        let subject_id = self.profiles.login(login, secret).await.map_err(|e| {
            tracing::warn!(error = %e, "Login rejected");
            AuthError::AuthenticationFailed
        })?;

        let tokens = self.issue(subject_id).await?;

        tracing::info!(subject_id = %subject_id, "Session issued");
        Ok(tokens)
    }

    /// Exchange a live refresh token for a new pair, invalidating the old one
    ///
    /// Checks run in order and the first failure wins:
    /// stored digest lookup, digest comparison, pair consistency.
    ///
    /// # Errors
    /// - `UnknownSubject` if no profile exists for `subject_id`
    /// - `StaleOrRevokedToken` if the refresh token is not the stored one
    /// - `Malformed`/`InvalidSignature`/`Expired` from decoding the pair
    /// - `MismatchedPair` if the two tokens name different subjects
    /// - `PersistenceFailed` if the profile service fails
    pub async fn rotate(
        &self,
        subject_id: Uuid,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<SessionTokens, AppError> {
        let stored = match self.profiles.get_refresh_hash(subject_id).await {
            Ok(stored) => stored,
            Err(ProfileError::NotFound) => return Err(AuthError::UnknownSubject.into()),
            Err(e) => return Err(AuthError::PersistenceFailed(e.to_string()).into()),
        };

        let presented = hash_refresh_token(refresh_token);
        match stored {
            Some(stored) if presented.matches(&stored) => {}
            _ => {
                tracing::warn!(subject_id = %subject_id, "Stale or revoked refresh token presented");
                return Err(AuthError::StaleOrRevokedToken.into());
            }
        }

        let access_subject = self.codec.extract_subject_id(access_token)?;
        let refresh_subject = self
            .codec
            .verify_kind(refresh_token, TokenKind::Refresh)?
            .subject_id()?;

        if access_subject != refresh_subject || refresh_subject != subject_id {
            tracing::warn!(subject_id = %subject_id, "Access and refresh tokens do not match");
            return Err(AuthError::MismatchedPair.into());
        }

        let tokens = self.issue(subject_id).await?;

        tracing::info!(subject_id = %subject_id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Delete a profile together with its stored refresh digest
    pub async fn delete_profile(&self, subject_id: Uuid) -> Result<(), AppError> {
        self.profiles
            .delete_profile(subject_id)
            .await
            .map_err(|e| match e {
                ProfileError::NotFound => AppError::from(AuthError::UnknownSubject),
                ProfileError::Unavailable(msg) => AppError::Unavailable(msg),
                other => AppError::Internal(format!("Profile deletion failed: {}", other)),
            })?;

        tracing::info!(subject_id = %subject_id, "Profile deleted");
        Ok(())
    }

    /// Mint a pair and overwrite the stored digest with the new refresh token's
    async fn issue(&self, subject_id: Uuid) -> Result<SessionTokens, AppError> {
        let access_token = self
            .codec
            .mint(subject_id, TokenKind::Access, self.access_token_expiry)?;
        let refresh_token = self
            .codec
            .mint(subject_id, TokenKind::Refresh, self.refresh_token_expiry)?;

        self.profiles
            .update_refresh_hash(subject_id, &hash_refresh_token(&refresh_token))
            .await
            .map_err(|e| {
                tracing::error!(subject_id = %subject_id, error = %e, "Failed to store refresh token digest");
                AuthError::PersistenceFailed(e.to_string())
            })?;

        Ok(SessionTokens {
            subject_id,
            access_token,
            refresh_token,
        })
    }
}
