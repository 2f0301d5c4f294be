//! Credential & Role Storage
//! Mission: Persist user accounts and role bindings behind narrow,
//! parameterized store contracts

use crate::auth::models::User;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use tracing::info;
use uuid::Uuid;

/// User creation failure.
///
/// Uniqueness is enforced by the store (unique indexes on username and
/// email); the constraint-violation signal is translated here so callers
/// never see raw storage errors.
#[derive(Debug)]
pub enum CreateUserError {
    AlreadyExists,
    Store(anyhow::Error),
}

impl std::fmt::Display for CreateUserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateUserError::AlreadyExists => write!(f, "Username or email already exists"),
            CreateUserError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for CreateUserError {}

/// Gateway to user credential records.
///
/// The core never constructs SQL against this contract; implementations
/// are authoritative and already parameterized.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn verify_password(&self, user: &User, password: &str) -> Result<bool>;
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, CreateUserError>;
    async fn search_users(&self, term: &str) -> Result<Vec<User>>;
}

/// Store for the user/role relation.
///
/// Bindings are a unique (user_id, role) pair set: presence implies
/// grant. Concurrent writes on the same pair must be safe through the
/// store's own atomicity, with no in-process locking.
#[async_trait::async_trait]
pub trait RoleStore: Send + Sync {
    async fn role_exists(&self, name: &str) -> Result<bool>;
    async fn create_role(&self, name: &str) -> Result<()>;
    async fn user_has_role(&self, user_id: &str, role: &str) -> Result<bool>;
    async fn add_user_role(&self, user_id: &str, role: &str) -> Result<bool>;
    async fn remove_user_role(&self, user_id: &str, role: &str) -> Result<bool>;
    async fn user_roles(&self, user_id: &str) -> Result<Vec<String>>;
}

/// SQLite-backed implementation of both store contracts.
pub struct SqliteAuthStore {
    db_path: String,
}

impl SqliteAuthStore {
    /// Create the store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS roles (
                name TEXT PRIMARY KEY
            )",
            [],
        )?;

        // Composite primary key keeps the binding set duplicate-free and
        // makes concurrent assigns collapse to a single row.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                PRIMARY KEY (user_id, role),
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (role) REFERENCES roles(name)
            )",
            [],
        )?;

        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path).context("Failed to open database")
    }

    fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            is_active: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    // `column` is always a compile-time constant; the value stays
    // parameterized.
    fn find_user_where(&self, column: &str, value: &str) -> Result<Option<User>> {
        let conn = self.open()?;
        let sql = format!(
            "SELECT id, username, email, password_hash, is_active, created_at
             FROM users WHERE {} = ?1",
            column
        );
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![value], Self::map_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for SqliteAuthStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.find_user_where("id", id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_user_where("username", username)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user_where("email", email)
    }

    async fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        verify(password, &user.password_hash).context("Failed to verify password")
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, CreateUserError> {
        let password_hash = hash(password, DEFAULT_COST)
            .context("Failed to hash password")
            .map_err(CreateUserError::Store)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            is_active: true,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.open().map_err(CreateUserError::Store)?;
        let result = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.username,
                user.email,
                user.password_hash,
                user.is_active,
                user.created_at,
            ],
        );

        match result {
            Ok(_) => {
                info!("✅ Created user: {}", user.username);
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(CreateUserError::AlreadyExists)
            }
            Err(e) => Err(CreateUserError::Store(
                anyhow::Error::new(e).context("Failed to insert user"),
            )),
        }
    }

    async fn search_users(&self, term: &str) -> Result<Vec<User>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, is_active, created_at
             FROM users WHERE username LIKE ?1 OR email LIKE ?1
             ORDER BY username",
        )?;

        let pattern = format!("%{}%", term);
        let users = stmt
            .query_map(params![pattern], Self::map_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }
}

#[async_trait::async_trait]
impl RoleStore for SqliteAuthStore {
    async fn role_exists(&self, name: &str) -> Result<bool> {
        let conn = self.open()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM roles WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn create_role(&self, name: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("INSERT OR IGNORE INTO roles (name) VALUES (?1)", params![name])?;
        Ok(())
    }

    async fn user_has_role(&self, user_id: &str, role: &str) -> Result<bool> {
        let conn = self.open()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM user_roles WHERE user_id = ?1 AND role = ?2",
            params![user_id, role],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn add_user_role(&self, user_id: &str, role: &str) -> Result<bool> {
        let conn = self.open()?;
        // INSERT OR IGNORE: a concurrent assign landing first still leaves
        // the binding present, which is the success condition.
        conn.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)",
            params![user_id, role],
        )?;
        Ok(true)
    }

    async fn remove_user_role(&self, user_id: &str, role: &str) -> Result<bool> {
        let conn = self.open()?;
        conn.execute(
            "DELETE FROM user_roles WHERE user_id = ?1 AND role = ?2",
            params![user_id, role],
        )?;
        Ok(true)
    }

    async fn user_roles(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.open()?;
        // rowid order = assignment order; kept for display only.
        let mut stmt = conn.prepare(
            "SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY rowid",
        )?;

        let roles = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (SqliteAuthStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = SqliteAuthStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[tokio::test]
    async fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let created = store
            .create_user("testuser", "test@test.com", "Password123!")
            .await
            .unwrap();
        assert_eq!(created.username, "testuser");
        assert!(created.is_active);

        let by_name = store.find_by_username("testuser").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_email = store.find_by_email("test@test.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "testuser");
    }

    #[tokio::test]
    async fn test_unknown_user_is_absent() {
        let (store, _temp) = create_test_store();
        assert!(store.find_by_username("ghost").await.unwrap().is_none());
        assert!(store.find_by_id("no-such-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_translated() {
        let (store, _temp) = create_test_store();

        store
            .create_user("dupe", "first@test.com", "password1")
            .await
            .unwrap();
        let err = store
            .create_user("dupe", "second@test.com", "password2")
            .await
            .unwrap_err();

        assert!(matches!(err, CreateUserError::AlreadyExists));
    }

    #[tokio::test]
    async fn test_duplicate_email_translated() {
        let (store, _temp) = create_test_store();

        store
            .create_user("first", "same@test.com", "password1")
            .await
            .unwrap();
        let err = store
            .create_user("second", "same@test.com", "password2")
            .await
            .unwrap_err();

        assert!(matches!(err, CreateUserError::AlreadyExists));
    }

    #[tokio::test]
    async fn test_password_verification() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("testuser", "test@test.com", "Password123!")
            .await
            .unwrap();

        assert!(store.verify_password(&user, "Password123!").await.unwrap());
        assert!(!store.verify_password(&user, "wrongpassword").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_users() {
        let (store, _temp) = create_test_store();

        store
            .create_user("alice", "alice@test.com", "password1")
            .await
            .unwrap();
        store
            .create_user("bob", "bob@test.com", "password2")
            .await
            .unwrap();

        let hits = store.search_users("ali").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "alice");

        let hits = store.search_users("test.com").await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store.search_users("nobody").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_role_creation_idempotent() {
        let (store, _temp) = create_test_store();

        assert!(!store.role_exists("Admin").await.unwrap());
        store.create_role("Admin").await.unwrap();
        store.create_role("Admin").await.unwrap();
        assert!(store.role_exists("Admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_role_bindings() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("testuser", "test@test.com", "password")
            .await
            .unwrap();
        store.create_role("User").await.unwrap();
        store.create_role("Admin").await.unwrap();

        assert!(!store.user_has_role(&user.id, "User").await.unwrap());

        assert!(store.add_user_role(&user.id, "User").await.unwrap());
        assert!(store.add_user_role(&user.id, "Admin").await.unwrap());
        // Duplicate insert is absorbed by the pair's primary key
        assert!(store.add_user_role(&user.id, "User").await.unwrap());

        assert!(store.user_has_role(&user.id, "User").await.unwrap());
        assert_eq!(
            store.user_roles(&user.id).await.unwrap(),
            vec!["User", "Admin"]
        );

        assert!(store.remove_user_role(&user.id, "User").await.unwrap());
        assert!(!store.user_has_role(&user.id, "User").await.unwrap());
        assert_eq!(store.user_roles(&user.id).await.unwrap(), vec!["Admin"]);
    }

    #[tokio::test]
    async fn test_roles_for_unknown_user_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.user_roles("no-such-user").await.unwrap().is_empty());
    }
}
