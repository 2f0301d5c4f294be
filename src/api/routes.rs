//! Router assembly.
//!
//! Route groups are gated by policy: public, any-authenticated, mixed
//! role, and admin-only. Public routes bypass the guard entirely; that is
//! a routing decision, the gate itself stays composable.

use crate::api::{admin, users};
use crate::auth::{
    api::{self as auth_api, AuthState},
    middleware::{guard_middleware, RouteGuard},
    roles::{ADMIN, USER},
};
use crate::middleware::request_logging;
use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

/// Create the API router
pub fn create_router(state: AuthState) -> Router {
    let tokens = state.tokens.clone();

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/users", post(users::register))
        .with_state(state.clone());

    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route("/api/users/profile", get(users::profile))
        .route("/api/users/search", get(users::search))
        .route_layer(middleware::from_fn_with_state(
            RouteGuard::authenticated(tokens.clone()),
            guard_middleware,
        ))
        .with_state(state.clone());

    let elevated_routes = Router::new()
        .route("/api/users/sensitive-data", get(users::sensitive_data))
        .route_layer(middleware::from_fn_with_state(
            RouteGuard::require_any(&[ADMIN, USER], tokens.clone()),
            guard_middleware,
        ))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/api/admin/assign-role", post(admin::assign_role))
        .route("/api/admin/remove-role", post(admin::remove_role))
        .route("/api/admin/user-roles/:user_id", get(admin::user_roles))
        .route("/api/users/admin-only", get(users::admin_only))
        .route_layer(middleware::from_fn_with_state(
            RouteGuard::require_any(&[ADMIN], tokens),
            guard_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(elevated_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
