/// Request Authentication Middleware
///
/// Validates the bearer token on every request to a protected scope and
/// attaches the decoded subject to the request extensions. Never mints,
/// rotates or persists anything.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::{TokenCodec, TokenKind};
use crate::error::{AppError, AuthError};

const BEARER: &str = "Bearer";

/// Subject of a request that passed authentication
///
/// Read it in handlers with `web::ReqData<AuthenticatedSubject>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedSubject {
    pub subject_id: Uuid,
}

/// Header parsing and token verification, independent of actix
#[derive(Clone)]
pub struct RequestAuthenticator {
    codec: TokenCodec,
}

impl RequestAuthenticator {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// Decide a request from its `Authorization` header value
    ///
    /// # Errors
    /// - `MissingToken` when there is no header
    /// - `Malformed` unless the header is exactly `Bearer <token>`
    /// - `InvalidSignature`/`Expired`/`Malformed` from the codec
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthenticatedSubject, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = parse_bearer(header)?;

        let claims = self.codec.verify_kind(token, TokenKind::Access)?;
        Ok(AuthenticatedSubject {
            subject_id: claims.subject_id()?,
        })
    }
}

fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if *scheme == BEARER && !token.is_empty() => Ok(token),
        _ => Err(AuthError::Malformed(
            "authorization header is not `Bearer <token>`".to_string(),
        )),
    }
}

/// Actix middleware guarding a scope with a `RequestAuthenticator`
pub struct JwtMiddleware {
    authenticator: RequestAuthenticator,
}

impl JwtMiddleware {
    pub fn new(authenticator: RequestAuthenticator) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    authenticator: RequestAuthenticator,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .map(|h| h.to_str().unwrap_or_default());

        match self.authenticator.authenticate(header) {
            Ok(subject) => {
                tracing::debug!(subject_id = %subject.subject_id, "Request authenticated");
                req.extensions_mut().insert(subject);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(
                    path = %req.path(),
                    kind = e.kind(),
                    "Request rejected by authenticator"
                );
                Box::pin(async move { Err(AppError::from(e).into()) })
            }
        }
    }
}
