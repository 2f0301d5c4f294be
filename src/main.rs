//! AuthGate - Authentication & Authorization Backend
//! Mission: Credential verification, signed-token issuance, and RBAC
//! behind a defensive input-validation pipeline

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authgate_backend::{
    api::routes::create_router,
    auth::{
        roles::{ADMIN, USER},
        store::{CredentialStore, SqliteAuthStore},
        AuthState, RoleService, TokenService,
    },
    models::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let store = Arc::new(SqliteAuthStore::new(&config.database_path)?);
    let tokens = Arc::new(TokenService::new(
        config.jwt_secret.clone(),
        config.jwt_issuer.clone(),
        config.jwt_audience.clone(),
        config.token_lifetime_secs,
    ));
    let role_service = Arc::new(RoleService::new(store.clone(), store.clone()));

    // Seed the well-known role set, then make sure an admin can log in.
    role_service.ensure_roles_exist().await?;
    ensure_default_admin(store.clone(), &role_service).await?;

    let state = AuthState::new(store, role_service, tokens);
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Create the default admin account on first start.
async fn ensure_default_admin(
    store: Arc<SqliteAuthStore>,
    role_service: &RoleService,
) -> Result<()> {
    if store.find_by_username("admin").await?.is_some() {
        return Ok(());
    }

    let password =
        std::env::var("DEFAULT_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

    let admin = store
        .create_user("admin", "admin@authgate.local", &password)
        .await
        .context("Failed to create default admin")?;

    role_service.assign(&admin.id, ADMIN).await?;
    role_service.assign(&admin.id, USER).await?;

    info!("🔐 Default admin user created (username: admin)");
    warn!("⚠️  CHANGE DEFAULT ADMIN PASSWORD IN PRODUCTION!");

    Ok(())
}
