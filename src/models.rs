//! Application configuration, loaded from the environment.

use anyhow::{Context, Result};

/// Runtime configuration.
///
/// The signing secret has no default: a process without `JWT_SECRET` must
/// fail to start rather than sign tokens with a known key.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_lifetime_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./authgate.db".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let jwt_secret = std::env::var("JWT_SECRET")
            .context("JWT_SECRET must be set (the signing key is never hard-coded)")?;

        let jwt_issuer =
            std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authgate".to_string());

        let jwt_audience =
            std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authgate-clients".to_string());

        // 1 hour unless overridden
        let token_lifetime_secs = std::env::var("TOKEN_LIFETIME_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        Ok(Self {
            database_path,
            port,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            token_lifetime_secs,
        })
    }
}
