/// Authentication Routes
///
/// Thin adapters from HTTP onto the session service: sign-up, login,
/// token-pair refresh, profile deletion and the current subject.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, ErrorContext};
use crate::middleware::AuthenticatedSubject;
use crate::session::{SessionService, SessionTokens};

/// Sign-up request
#[derive(Deserialize)]
pub struct SignUpRequest {
    pub login: String,
    pub password: String,
    pub username: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Token pair refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

/// Issued token pair
#[derive(Serialize)]
pub struct AuthResponse {
    pub id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn new(tokens: SessionTokens, expires_in: i64) -> Self {
        Self {
            id: tokens.subject_id,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[derive(Serialize)]
pub struct SubjectResponse {
    pub id: Uuid,
}

/// POST /auth/signup
///
/// # Errors
/// - 400: empty login/username or password outside the accepted length
/// - 409: login already taken
/// - 503: profile service unavailable
pub async fn sign_up(
    form: web::Json<SignUpRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("sign_up");

    let subject_id = sessions
        .sign_up(&form.login, &form.password, &form.username)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Created().json(SubjectResponse { id: subject_id }))
}

/// POST /auth/login
///
/// # Errors
/// - 401: any failure; the body never says which field was wrong
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("login");

    let tokens = sessions
        .login(&form.login, &form.password)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    tracing::info!(
        request_id = %context.request_id,
        subject_id = %tokens.subject_id,
        "User logged in"
    );

    Ok(HttpResponse::Ok().json(AuthResponse::new(tokens, sessions.access_token_expiry())))
}

/// POST /auth/refresh
///
/// Rotates the refresh token: the presented one stops working as soon as
/// the new one is stored.
///
/// # Errors
/// - 401: stale, mismatched, expired or otherwise invalid pair, or a failed
///   rotation; the client must log in again
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh").with_subject_id(form.id);

    let tokens = sessions
        .rotate(form.id, &form.access_token, &form.refresh_token)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Ok().json(AuthResponse::new(tokens, sessions.access_token_expiry())))
}

/// DELETE /auth/profile
///
/// **Requires** `Authorization: Bearer <access_token>`; the subject comes
/// from the token, never from the request body.
pub async fn delete_profile(
    subject: web::ReqData<AuthenticatedSubject>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("delete_profile").with_subject_id(subject.subject_id);

    sessions
        .delete_profile(subject.subject_id)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Ok().json(SubjectResponse {
        id: subject.subject_id,
    }))
}

/// GET /auth/me
///
/// **Requires** `Authorization: Bearer <access_token>`.
pub async fn get_current_user(subject: web::ReqData<AuthenticatedSubject>) -> HttpResponse {
    HttpResponse::Ok().json(SubjectResponse {
        id: subject.subject_id,
    })
}
