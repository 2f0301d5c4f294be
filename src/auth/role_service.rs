//! Role Manager
//! Mission: Maintain the user/role relation with idempotent, race-tolerant
//! operations

use crate::auth::roles::ALL_ROLES;
use crate::auth::store::{CredentialStore, RoleStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Manages role assignment over the credential and role store contracts.
///
/// Absence of the target user is a soft failure (`Ok(false)`), never an
/// error; only storage failures propagate as `Err`. No in-process locking:
/// the check-then-act pattern tolerates a benign race because the store's
/// binding set is idempotent under concurrent writes.
pub struct RoleService {
    users: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleStore>,
}

impl RoleService {
    pub fn new(users: Arc<dyn CredentialStore>, roles: Arc<dyn RoleStore>) -> Self {
        Self { users, roles }
    }

    /// Assign a role to a user, creating the role on first use.
    ///
    /// Returns false if the user does not exist; an existing binding is a
    /// no-op success.
    pub async fn assign(&self, user_id: &str, role: &str) -> Result<bool> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Ok(false);
        }

        if !self.roles.role_exists(role).await? {
            self.roles.create_role(role).await?;
            info!("Created role on first assignment: {}", role);
        }

        if self.roles.user_has_role(user_id, role).await? {
            return Ok(true);
        }

        self.roles.add_user_role(user_id, role).await
    }

    /// Remove a role from a user.
    ///
    /// Returns false if the user does not exist; a missing binding is a
    /// no-op success.
    pub async fn remove(&self, user_id: &str, role: &str) -> Result<bool> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Ok(false);
        }

        if !self.roles.user_has_role(user_id, role).await? {
            return Ok(true);
        }

        self.roles.remove_user_role(user_id, role).await
    }

    /// List a user's roles in assignment order. Empty for unknown users.
    pub async fn list_roles(&self, user_id: &str) -> Result<Vec<String>> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Ok(Vec::new());
        }

        self.roles.user_roles(user_id).await
    }

    /// Idempotently create every well-known role. Run once at startup.
    pub async fn ensure_roles_exist(&self) -> Result<()> {
        for role in ALL_ROLES {
            if !self.roles.role_exists(role).await? {
                self.roles.create_role(role).await?;
                info!("🔐 Created well-known role: {}", role);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::SqliteAuthStore;
    use tempfile::NamedTempFile;

    fn setup() -> (RoleService, Arc<SqliteAuthStore>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Arc::new(SqliteAuthStore::new(temp_file.path().to_str().unwrap()).unwrap());
        let service = RoleService::new(store.clone(), store.clone());
        (service, store, temp_file)
    }

    #[tokio::test]
    async fn test_assign_creates_missing_role() {
        let (service, store, _temp) = setup();
        let user = store
            .create_user("u1", "u1@test.com", "password")
            .await
            .unwrap();

        // "Admin" does not exist yet: it is created, the binding inserted
        assert!(!store.role_exists("Admin").await.unwrap());
        assert!(service.assign(&user.id, "Admin").await.unwrap());
        assert!(store.role_exists("Admin").await.unwrap());
        assert_eq!(service.list_roles(&user.id).await.unwrap(), vec!["Admin"]);
    }

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let (service, store, _temp) = setup();
        let user = store
            .create_user("u1", "u1@test.com", "password")
            .await
            .unwrap();

        assert!(service.assign(&user.id, "User").await.unwrap());
        assert!(service.assign(&user.id, "User").await.unwrap());
        assert_eq!(service.list_roles(&user.id).await.unwrap(), vec!["User"]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (service, store, _temp) = setup();
        let user = store
            .create_user("u1", "u1@test.com", "password")
            .await
            .unwrap();

        // No binding: removal is a no-op success, state unchanged
        assert!(service.remove(&user.id, "Admin").await.unwrap());

        service.assign(&user.id, "Admin").await.unwrap();
        assert!(service.remove(&user.id, "Admin").await.unwrap());
        assert!(service.remove(&user.id, "Admin").await.unwrap());
        assert!(service.list_roles(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_is_soft_failure() {
        let (service, _store, _temp) = setup();

        assert!(!service.assign("no-such-user", "Admin").await.unwrap());
        assert!(!service.remove("no-such-user", "Admin").await.unwrap());
        assert!(service.list_roles("no-such-user").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_roles_exist_idempotent() {
        let (service, store, _temp) = setup();

        service.ensure_roles_exist().await.unwrap();
        service.ensure_roles_exist().await.unwrap();

        assert!(store.role_exists("Admin").await.unwrap());
        assert!(store.role_exists("User").await.unwrap());
    }
}
