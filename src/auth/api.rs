//! Authentication API Endpoints
//! Mission: Provide the login endpoint and token introspection

use crate::auth::{
    jwt::{Claims, TokenService},
    middleware::extract_claims,
    models::{LoginRequest, LoginResponse},
    role_service::RoleService,
    store::CredentialStore,
};
use crate::validation::validate_username;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<dyn CredentialStore>,
    pub role_service: Arc<RoleService>,
    pub tokens: Arc<TokenService>,
}

impl AuthState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        role_service: Arc<RoleService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            role_service,
            tokens,
        }
    }
}

/// Login endpoint - POST /api/auth/login
///
/// The username is validated before the credential store is touched, so
/// malformed or injected input never reaches a lookup. Unknown user and
/// wrong password produce the same uniform error.
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let username = validate_username(&payload.username)
        .into_result()
        .map_err(AuthApiError::ValidationFailed)?;

    info!("🔐 Login attempt: {}", username);

    let user = match state
        .store
        .find_by_username(&username)
        .await
        .map_err(internal)?
    {
        Some(user) => user,
        None => {
            warn!("❌ Failed login attempt: {}", username);
            return Err(AuthApiError::InvalidCredentials);
        }
    };

    let valid = state
        .store
        .verify_password(&user, &payload.password)
        .await
        .map_err(internal)?;

    if !valid {
        warn!("❌ Failed login attempt: {}", username);
        return Err(AuthApiError::InvalidCredentials);
    }

    let roles = state
        .role_service
        .list_roles(&user.id)
        .await
        .map_err(internal)?;

    let issued = state
        .tokens
        .issue(&user, roles.clone())
        .map_err(internal)?;

    info!("✅ Login successful: {}", user.username);

    Ok(Json(LoginResponse {
        token: issued.token,
        username: user.username,
        roles,
        expiration: issued.expires_at,
    }))
}

/// Current token claims - GET /api/auth/me
///
/// Pure claims echo: no database lookup, the guard already verified the
/// token.
pub async fn me(req: Request) -> Result<Json<Claims>, AuthApiError> {
    let claims = extract_claims(&req).ok_or(AuthApiError::Unauthorized)?;
    Ok(Json(claims.clone()))
}

fn internal(err: anyhow::Error) -> AuthApiError {
    error!("Internal error during authentication: {:#}", err);
    AuthApiError::Internal
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    /// Input failed validation; the message names the violated rule.
    ValidationFailed(String),
    /// Uniform for unknown user and wrong password alike.
    InvalidCredentials,
    Unauthorized,
    Internal,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::ValidationFailed(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AuthApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            AuthApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_api_error_responses() {
        let validation = AuthApiError::ValidationFailed("Username cannot be empty".to_string())
            .into_response();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let invalid_creds = AuthApiError::InvalidCredentials.into_response();
        assert_eq!(invalid_creds.status(), StatusCode::UNAUTHORIZED);

        let unauthorized = AuthApiError::Unauthorized.into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let internal = AuthApiError::Internal.into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
