use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{SystemClock, TokenCodec};
use crate::configuration::{ProfileSettings, Settings};
use crate::error::AppError;
use crate::middleware::{JwtMiddleware, LoggerMiddleware, RequestAuthenticator};
use crate::profile::{HttpProfileClient, InMemoryProfileStore, ProfileStore};
use crate::routes::{delete_profile, get_current_user, health_check, login, refresh, sign_up};
use crate::session::SessionService;

/// Pick the remote profile service when configured, the in-memory store otherwise
pub fn build_profile_store(settings: &ProfileSettings) -> Result<Arc<dyn ProfileStore>, AppError> {
    match &settings.base_url {
        Some(base_url) => {
            let http_client = reqwest::Client::builder()
                .timeout(settings.timeout())
                .build()
                .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
            tracing::info!(base_url = %base_url, "Using remote profile service");
            Ok(Arc::new(HttpProfileClient::new(base_url.clone(), http_client)))
        }
        None => {
            tracing::warn!("No profile service configured, using in-memory profile store");
            Ok(Arc::new(InMemoryProfileStore::new()))
        }
    }
}

/// Wire the token codec, wall clock and profile store into a session service
pub fn build_session_service(
    settings: &Settings,
    profiles: Arc<dyn ProfileStore>,
) -> Result<SessionService, AppError> {
    let codec = TokenCodec::new(&settings.jwt, Arc::new(SystemClock))?;
    Ok(SessionService::new(codec, profiles, &settings.jwt))
}

pub fn run(listener: TcpListener, sessions: SessionService) -> Result<Server, std::io::Error> {
    let authenticator = RequestAuthenticator::new(sessions.codec().clone());
    let sessions = web::Data::new(sessions);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(LoggerMiddleware)
            .app_data(sessions.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/signup", web::post().to(sign_up))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            // Protected routes
            .service(
                web::scope("/auth")
                    .wrap(JwtMiddleware::new(authenticator.clone()))
                    .route("/me", web::get().to(get_current_user))
                    .route("/profile", web::delete().to(delete_profile)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
