//! Role administration endpoints (Admin only).

use crate::api::ApiError;
use crate::auth::{api::AuthState, models::RoleRequest, roles};
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

/// Assign a role to a user - POST /api/admin/assign-role
///
/// Role names outside the well-known set are rejected before the role
/// manager runs.
pub async fn assign_role(
    State(state): State<AuthState>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<Value>, ApiError> {
    if !roles::is_known_role(&payload.role) {
        return Err(ApiError::BadRequest("Invalid role".to_string()));
    }

    let success = state
        .role_service
        .assign(&payload.user_id, &payload.role)
        .await?;

    if !success {
        return Err(ApiError::BadRequest("Failed to assign role".to_string()));
    }

    info!("✅ Assigned role {} to user {}", payload.role, payload.user_id);

    Ok(Json(json!({
        "message": format!("Role {} assigned successfully", payload.role),
    })))
}

/// Remove a role from a user - POST /api/admin/remove-role
pub async fn remove_role(
    State(state): State<AuthState>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<Value>, ApiError> {
    let success = state
        .role_service
        .remove(&payload.user_id, &payload.role)
        .await?;

    if !success {
        return Err(ApiError::BadRequest("Failed to remove role".to_string()));
    }

    info!(
        "🗑️  Removed role {} from user {}",
        payload.role, payload.user_id
    );

    Ok(Json(json!({
        "message": format!("Role {} removed successfully", payload.role),
    })))
}

/// List a user's roles - GET /api/admin/user-roles/:user_id
///
/// Returns an empty list for unknown users.
pub async fn user_roles(
    State(state): State<AuthState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let roles = state.role_service.list_roles(&user_id).await?;
    Ok(Json(roles))
}
