/// Middleware module
///
/// Request authentication for protected routes and request logging.

mod authenticator;
mod request_logger;

pub use authenticator::{AuthenticatedSubject, JwtMiddleware, RequestAuthenticator};
pub use request_logger::LoggerMiddleware;
