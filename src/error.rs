/// Error Handling Module
///
/// Unified error handling for the gateway:
/// 1. Authentication failure taxonomy (token engine)
/// 2. Input validation and configuration errors
/// 3. HTTP response mapping that never reveals which auth check failed
/// 4. Structured error logging with request context

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Authentication failure kinds produced by the token engine.
///
/// The variants are distinct so that callers and logs can tell them apart.
/// At the HTTP boundary every variant collapses into the same 401 response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Bad credentials, unknown login, or the profile service refused the login.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// No `Authorization` header on a protected request.
    #[error("Missing authentication token")]
    MissingToken,

    /// Token or header is structurally invalid.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Token signature does not match the signing key.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Signature is valid but `now >= exp`.
    #[error("Token has expired")]
    Expired,

    /// Presented refresh token does not hash to the stored value.
    #[error("Refresh token is stale or revoked")]
    StaleOrRevokedToken,

    /// Access and refresh tokens decode to different subjects.
    #[error("Access and refresh tokens do not belong to the same subject")]
    MismatchedPair,

    /// No profile exists for the subject.
    #[error("Unknown subject")]
    UnknownSubject,

    /// The profile service failed while reading or writing the refresh hash.
    #[error("Refresh token persistence failed: {0}")]
    PersistenceFailed(String),
}

impl AuthError {
    /// Stable identifier used in server-side logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::AuthenticationFailed => "authentication_failed",
            AuthError::MissingToken => "missing_token",
            AuthError::Malformed(_) => "malformed",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::StaleOrRevokedToken => "stale_or_revoked",
            AuthError::MismatchedPair => "mismatched_pair",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::PersistenceFailed(_) => "persistence_failed",
        }
    }
}

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(String),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(String, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(String, usize),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required config: {0}")]
    MissingRequired(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type returned by services and route handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// ============================================================================
/// 3. HTTP RESPONSE MAPPING
/// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique ID of this error response
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The single body every authentication failure is reported with.
    pub fn unauthorized(error_id: String) -> Self {
        Self::new(
            error_id,
            "Unauthorized".to_string(),
            "UNAUTHORIZED".to_string(),
            StatusCode::UNAUTHORIZED.as_u16(),
        )
    }
}

/// Trait for converting errors to HTTP responses
///
/// Logging happens where the failure is observed (handlers through
/// `ErrorContext`, the authenticator for rejected requests), not here.
pub trait ErrorHandler {
    fn error_response(&self, error_id: &str) -> (StatusCode, ErrorResponse);
}

impl ErrorHandler for AppError {
    fn error_response(&self, error_id: &str) -> (StatusCode, ErrorResponse) {
        let status = self.status_code();
        let body = match self {
            // Never tell the client which check failed
            AppError::Auth(_) => ErrorResponse::unauthorized(error_id.to_string()),
            AppError::Validation(e) => ErrorResponse::new(
                error_id.to_string(),
                e.to_string(),
                "VALIDATION_ERROR".to_string(),
                status.as_u16(),
            ),
            AppError::Conflict(msg) => ErrorResponse::new(
                error_id.to_string(),
                msg.clone(),
                "CONFLICT".to_string(),
                status.as_u16(),
            ),
            AppError::Unavailable(_) => ErrorResponse::new(
                error_id.to_string(),
                "Upstream service temporarily unavailable".to_string(),
                "SERVICE_UNAVAILABLE".to_string(),
                status.as_u16(),
            ),
            AppError::Config(_) => ErrorResponse::new(
                error_id.to_string(),
                "Server configuration error".to_string(),
                "CONFIG_ERROR".to_string(),
                status.as_u16(),
            ),
            AppError::Internal(_) => ErrorResponse::new(
                error_id.to_string(),
                "Internal server error".to_string(),
                "INTERNAL_ERROR".to_string(),
                status.as_u16(),
            ),
        };

        (status, body)
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &error_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// ============================================================================
/// 4. ERROR CONTEXT ENRICHMENT
/// ============================================================================

/// Per-operation context attached to success and failure logs
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub subject_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            subject_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_subject_id(mut self, subject_id: impl ToString) -> Self {
        self.subject_id = Some(subject_id.to_string());
        self
    }

    pub fn log_error(&self, error: &AppError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "subject_id": self.subject_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        match error {
            AppError::Auth(e) => {
                tracing::warn!(
                    error = %error,
                    kind = e.kind(),
                    context = ?context,
                    "Authentication error"
                );
            }
            AppError::Validation(_) | AppError::Conflict(_) => {
                tracing::warn!(error = %error, context = ?context, "Request rejected");
            }
            _ => {
                tracing::error!(error = %error, context = ?context, "Operation failed");
            }
        }
    }
}
