use actix_web::HttpResponse;

/// GET /health_check
///
/// Liveness only; does not reach the profile service.
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().body("OK")
}
