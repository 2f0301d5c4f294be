//! User registration, search, and access-tier demo endpoints.

use crate::api::ApiError;
use crate::auth::{
    api::AuthState,
    middleware::{extract_claims, GateError},
    models::{RegisterRequest, UserResponse},
    store::{CreateUserError, CredentialStore},
};
use crate::validation::{strip_dangerous, validate_email, validate_username};
use axum::{
    extract::{Query, Request, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Register a user - POST /api/users
///
/// Both identity fields run the full validation pipeline before the store
/// is touched; only sanitized values are persisted.
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let username = validate_username(&payload.username)
        .into_result()
        .map_err(ApiError::BadRequest)?;

    let email = validate_email(&payload.email)
        .into_result()
        .map_err(ApiError::BadRequest)?;

    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let user = state
        .store
        .create_user(&username, &email, &payload.password)
        .await
        .map_err(|e| match e {
            CreateUserError::AlreadyExists => {
                warn!("Rejected duplicate registration: {}", username);
                ApiError::Conflict("Username or email already exists".to_string())
            }
            CreateUserError::Store(err) => ApiError::Internal(err),
        })?;

    Ok(Json(UserResponse::from_user(&user)))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub term: Option<String>,
}

/// Search users - GET /api/users/search?term=
///
/// The term is denylist-sanitized before it reaches the (parameterized)
/// store query; the sanitization is defense-in-depth, not the SQL defense.
pub async fn search(
    State(state): State<AuthState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let term = params.term.unwrap_or_default();
    if term.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Search term cannot be empty".to_string(),
        ));
    }

    let sanitized = strip_dangerous(term.trim());

    let users = state.store.search_users(&sanitized).await?;
    let response = users.iter().map(UserResponse::from_user).collect();

    Ok(Json(response))
}

/// Profile for the authenticated identity - GET /api/users/profile
pub async fn profile(req: Request) -> Result<Json<Value>, GateError> {
    let claims = extract_claims(&req).ok_or(GateError::Unauthorized)?;

    Ok(Json(json!({
        "id": claims.sub,
        "username": claims.username,
        "email": claims.email,
        "roles": claims.roles,
    })))
}

/// Requires the Admin or User role - GET /api/users/sensitive-data
pub async fn sensitive_data() -> Json<Value> {
    Json(json!({ "data": "Sensitive data" }))
}

/// Requires the Admin role - GET /api/users/admin-only
pub async fn admin_only() -> Json<Value> {
    Json(json!({ "data": "Admin only data" }))
}
