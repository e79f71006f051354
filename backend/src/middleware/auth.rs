//! Placeholder authentication stage.
//!
//! Runs between [`crate::Trace`] and the unit-of-work scope. It records
//! whether a bearer token was presented and attaches a [`CurrentUser`] to the
//! request; no token is verified yet, so every request is anonymous.

use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::UserId;

/// Token settings the stage will verify against.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared signing secret.
    pub secret: String,
    /// Signing algorithm name, e.g. `HS256`.
    pub algorithm: String,
    /// Token lifetime in minutes.
    pub expire_minutes: u32,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("expire_minutes", &self.expire_minutes)
            .finish()
    }
}

/// Identity resolved for the request. Always anonymous for now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentUser {
    user_id: Option<UserId>,
    presented_token: bool,
}

impl CurrentUser {
    /// Authenticated user, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Whether the request carried a bearer token.
    pub fn presented_token(&self) -> bool {
        self.presented_token
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<Self>()
            .copied()
            .unwrap_or_default()))
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware factory attaching a [`CurrentUser`] to every request.
#[derive(Clone)]
pub struct Authenticate {
    config: Arc<JwtConfig>,
}

impl Authenticate {
    /// Build the stage around the token settings.
    pub fn new(config: JwtConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware {
            service,
            config: Arc::clone(&self.config),
        }))
    }
}

/// Service wrapper produced by [`Authenticate`].
pub struct AuthenticateMiddleware<S> {
    service: S,
    config: Arc<JwtConfig>,
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let presented_token = bearer_token(&req).is_some();
        // TODO: verify the token against `self.config` and resolve the user id.
        debug!(
            presented_token,
            algorithm = %self.config.algorithm,
            "request authenticated as anonymous"
        );
        req.extensions_mut().insert(CurrentUser {
            user_id: None,
            presented_token,
        });
        self.service.call(req)
    }
}
