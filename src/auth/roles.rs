//! Role Constants
//! Mission: Define the well-known role set for RBAC

/// Full access, including user and role management.
pub const ADMIN: &str = "Admin";

/// Standard authenticated access.
pub const USER: &str = "User";

/// Every role the API will accept for assignment. Roles outside this set
/// are rejected at the boundary before they reach the role manager.
pub const ALL_ROLES: [&str; 2] = [ADMIN, USER];

pub fn is_known_role(name: &str) -> bool {
    ALL_ROLES.contains(&name)
}
