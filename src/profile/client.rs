use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NewProfile, ProfileError, ProfileStore};
use crate::auth::RefreshTokenHash;

/// JSON-over-HTTP client for the remote profile service
#[derive(Clone)]
pub struct HttpProfileClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateProfileRequest<'a> {
    login: &'a str,
    password_hash: &'a str,
    username: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Serialize, Deserialize)]
struct RefreshHashBody {
    refresh_token_hash: Option<RefreshTokenHash>,
}

#[derive(Deserialize)]
struct IdResponse {
    id: Uuid,
}

impl HttpProfileClient {
    pub fn new(base_url: String, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(e: reqwest::Error) -> ProfileError {
    tracing::error!("Profile service request failed: {}", e);
    ProfileError::Unavailable(e.to_string())
}

/// Map non-success statuses onto the store contract
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProfileError> {
    match response.status() {
        s if s.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(ProfileError::NotFound),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProfileError::InvalidCredentials),
        StatusCode::CONFLICT => Err(ProfileError::AlreadyExists),
        s => {
            tracing::error!(status = s.as_u16(), "Profile service returned error");
            Err(ProfileError::Unavailable(format!("status {}", s)))
        }
    }
}

#[async_trait]
impl ProfileStore for HttpProfileClient {
    async fn create_profile(&self, profile: NewProfile) -> Result<Uuid, ProfileError> {
        let request = CreateProfileRequest {
            login: &profile.login,
            password_hash: &profile.password_hash,
            username: &profile.username,
        };

        let response = self
            .http_client
            .post(self.url("/profiles"))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let body: IdResponse = check_status(response)?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(body.id)
    }

    async fn login(&self, login: &str, secret: &str) -> Result<Uuid, ProfileError> {
        let response = self
            .http_client
            .post(self.url("/profiles/login"))
            .json(&LoginRequest {
                login,
                password: secret,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let body: IdResponse = check_status(response)?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(body.id)
    }

    async fn update_refresh_hash(
        &self,
        subject_id: Uuid,
        hash: &RefreshTokenHash,
    ) -> Result<(), ProfileError> {
        let response = self
            .http_client
            .put(self.url(&format!("/profiles/{}/refresh-token", subject_id)))
            .json(&RefreshHashBody {
                refresh_token_hash: Some(hash.clone()),
            })
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)?;
        Ok(())
    }

    async fn get_refresh_hash(
        &self,
        subject_id: Uuid,
    ) -> Result<Option<RefreshTokenHash>, ProfileError> {
        let response = self
            .http_client
            .get(self.url(&format!("/profiles/{}/refresh-token", subject_id)))
            .send()
            .await
            .map_err(transport_error)?;

        let body: RefreshHashBody = check_status(response)?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(body.refresh_token_hash)
    }

    async fn delete_profile(&self, subject_id: Uuid) -> Result<(), ProfileError> {
        let response = self
            .http_client
            .delete(self.url(&format!("/profiles/{}", subject_id)))
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)?;
        Ok(())
    }
}
