//! Authentication Middleware
//! Mission: Apply the authorization gate to route groups

use crate::auth::gate::{authorize, AccessPolicy, Decision, DenyReason};
use crate::auth::jwt::{Claims, TokenService};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Per-route-group gate state: the access policy plus the token service
/// that verifies bearer tokens.
#[derive(Clone)]
pub struct RouteGuard {
    policy: AccessPolicy,
    tokens: Arc<TokenService>,
}

impl RouteGuard {
    pub fn public(tokens: Arc<TokenService>) -> Self {
        Self {
            policy: AccessPolicy::Public,
            tokens,
        }
    }

    pub fn authenticated(tokens: Arc<TokenService>) -> Self {
        Self {
            policy: AccessPolicy::Authenticated,
            tokens,
        }
    }

    pub fn require_any(roles: &'static [&'static str], tokens: Arc<TokenService>) -> Self {
        Self {
            policy: AccessPolicy::RequireAny(roles),
            tokens,
        }
    }
}

/// Middleware that runs the gate for its route group.
///
/// On allow, verified claims are added to request extensions so handlers
/// can read them without re-verifying the token.
pub async fn guard_middleware(
    State(guard): State<RouteGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    match authorize(guard.policy, token.as_deref(), &guard.tokens) {
        Decision::Allow(Some(claims)) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Decision::Allow(None) => Ok(next.run(req).await),
        Decision::Deny(DenyReason::Unauthenticated) => {
            debug!(path = %req.uri().path(), "Denied: unauthenticated");
            Err(GateError::Unauthorized)
        }
        Decision::Deny(DenyReason::Forbidden) => {
            debug!(path = %req.uri().path(), "Denied: insufficient role");
            Err(GateError::Forbidden)
        }
    }
}

/// Extract verified claims from a request (use behind the guard).
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

/// Gate denial responses. Deliberately uniform: the 401 never says which
/// token check failed.
#[derive(Debug)]
pub enum GateError {
    Unauthorized,
    Forbidden,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GateError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            GateError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        };

        (status, message).into_response()
    }
}
