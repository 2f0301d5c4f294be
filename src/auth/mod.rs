//! Authentication Module
//! Mission: Credential verification, signed bearer tokens, RBAC, and the
//! request-time authorization gate

pub mod api;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod role_service;
pub mod roles;
pub mod store;

pub use api::AuthState;
pub use jwt::TokenService;
pub use middleware::{guard_middleware, RouteGuard};
pub use role_service::RoleService;
pub use store::SqliteAuthStore;
