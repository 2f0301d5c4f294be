//! JWT Token Handler
//! Mission: Issue and verify signed bearer tokens carrying identity and
//! role claims

use crate::auth::models::User;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// JWT claims payload.
///
/// A token is a self-contained, stateless credential: validity is decided
/// purely from its signature and expiry at verification time. Role order
/// is preserved for display; authorization treats roles as a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user id)
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// A freshly issued token plus its structured claims, so callers can build
/// a response without parsing the token they just minted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
    pub expires_at: DateTime<Utc>,
}

/// Token verification failure.
///
/// All three variants collapse to one uniform "unauthorized" response at
/// the HTTP boundary; the failing check is never revealed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not parseable into header/payload/signature.
    Malformed,
    /// Past its expiry.
    Expired,
    /// Signature, issuer, or audience mismatch. Issuer/audience failures
    /// are deliberately indistinguishable from tampering.
    SignatureInvalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::SignatureInvalid => write!(f, "Invalid token signature"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies HS256 tokens with a configured secret, issuer,
/// audience, and lifetime. Pure computation, safe for unlimited
/// concurrent use.
pub struct TokenService {
    secret: String,
    issuer: String,
    audience: String,
    lifetime_secs: i64,
}

impl TokenService {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        lifetime_secs: i64,
    ) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            lifetime_secs,
        }
    }

    /// Generate a signed token for a user with the given roles.
    pub fn issue(&self, user: &User, roles: Vec<String>) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(chrono::Duration::seconds(self.lifetime_secs))
            .context("Invalid expiry timestamp")?;

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        debug!(
            "Issuing token for user {} ({}), expires at {}",
            user.username, user.id, expires_at
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")?;

        Ok(IssuedToken {
            token,
            claims,
            expires_at,
        })
    }

    /// Verify a token string and extract its claims.
    ///
    /// Signature comparison happens inside the JWT library and is
    /// constant-time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidToken
            | jsonwebtoken::errors::ErrorKind::Base64(_)
            | jsonwebtoken::errors::ErrorKind::Json(_)
            | jsonwebtoken::errors::ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::SignatureInvalid,
        })?;

        debug!("Verified token for user {}", decoded.claims.username);

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-with-at-least-32-characters";

    fn test_service() -> TokenService {
        TokenService::new(TEST_SECRET, "authgate", "authgate-clients", 3600)
    }

    fn test_user() -> User {
        User {
            id: "u-123".to_string(),
            username: "testuser".to_string(),
            email: "test@test.com".to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = test_service();
        let user = test_user();

        let issued = service
            .issue(&user, vec!["User".to_string(), "Admin".to_string()])
            .unwrap();
        assert!(!issued.token.is_empty());

        let claims = service.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "u-123");
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.email, "test@test.com");
        // Role order preserved for display
        assert_eq!(claims.roles, vec!["User", "Admin"]);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_issued_claims_match_without_reparse() {
        let service = test_service();
        let issued = service.issue(&test_user(), vec!["User".to_string()]).unwrap();

        // The structured claims returned alongside the token are the same
        // ones a verify would produce.
        let verified = service.verify(&issued.token).unwrap();
        assert_eq!(issued.claims.sub, verified.sub);
        assert_eq!(issued.claims.exp, verified.exp);
        assert_eq!(issued.expires_at.timestamp(), verified.exp);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative lifetime mints a token that is already past expiry.
        let service = TokenService::new(TEST_SECRET, "authgate", "authgate-clients", -7200);
        let issued = service.issue(&test_user(), vec![]).unwrap();

        assert_eq!(service.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let service = test_service();
        let issued = service.issue(&test_user(), vec!["User".to_string()]).unwrap();

        // Flip the last character of the signature segment, staying within
        // the base64url alphabet so the failure is the signature check.
        let mut tampered = issued.token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(
            service.verify(&tampered),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let other = TokenService::new(
            "another-secret-key-with-at-least-32-chars",
            "authgate",
            "authgate-clients",
            3600,
        );

        let issued = service.issue(&test_user(), vec![]).unwrap();
        assert_eq!(
            other.verify(&issued.token),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_issuer_and_audience_mismatch_look_like_tampering() {
        let service = test_service();
        let issued = service.issue(&test_user(), vec![]).unwrap();

        let wrong_issuer = TokenService::new(TEST_SECRET, "someone-else", "authgate-clients", 3600);
        assert_eq!(
            wrong_issuer.verify(&issued.token),
            Err(TokenError::SignatureInvalid)
        );

        let wrong_audience = TokenService::new(TEST_SECRET, "authgate", "other-clients", 3600);
        assert_eq!(
            wrong_audience.verify(&issued.token),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let service = test_service();
        assert_eq!(service.verify("garbage"), Err(TokenError::Malformed));
        assert_eq!(service.verify(""), Err(TokenError::Malformed));
    }
}
