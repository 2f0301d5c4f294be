//! Authorization Gate
//! Mission: Decide allow/deny from a bearer token and a required role set

use crate::auth::jwt::{Claims, TokenService};

/// Access requirement for a route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// No-op pass mode: the request is allowed without touching the token.
    /// Exists so public routes compose through the same gate.
    Public,
    /// Any valid token suffices (equivalent to an empty required-role set).
    Authenticated,
    /// Token must carry at least one of the listed roles.
    RequireAny(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Missing token, or any verification failure. Malformed, expired, and
    /// bad-signature tokens all land here so the reason is never leaked.
    Unauthenticated,
    /// Valid token without any of the required roles.
    Forbidden,
}

/// Gate decision. `Allow` carries the verified claims when a token was
/// presented (public routes allow without one).
#[derive(Debug, Clone)]
pub enum Decision {
    Allow(Option<Claims>),
    Deny(DenyReason),
}

/// The request-time authorization decision.
///
/// Terminal states: no token, malformed, expired, and invalid-signature
/// all deny as unauthenticated; a verified token with an insufficient
/// role set denies as forbidden; otherwise the request is allowed.
pub fn authorize(
    policy: AccessPolicy,
    token: Option<&str>,
    tokens: &TokenService,
) -> Decision {
    let required: &[&str] = match policy {
        AccessPolicy::Public => return Decision::Allow(None),
        AccessPolicy::Authenticated => &[],
        AccessPolicy::RequireAny(roles) => roles,
    };

    let Some(token) = token else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    let claims = match tokens.verify(token) {
        Ok(claims) => claims,
        Err(_) => return Decision::Deny(DenyReason::Unauthenticated),
    };

    if !required.is_empty()
        && !claims.roles.iter().any(|r| required.contains(&r.as_str()))
    {
        return Decision::Deny(DenyReason::Forbidden);
    }

    Decision::Allow(Some(claims))
}
