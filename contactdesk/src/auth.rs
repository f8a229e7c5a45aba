//! Password hashing and login tokens.
//!
//! Passwords are stored as bcrypt hashes with a fixed cost of 10. Hashing runs on
//! the blocking pool so it never stalls the request executor.
//!
//! Tokens are HS256 JWTs with the claims `{ id, iat, exp }`, where `id` is the hex
//! user id and `exp` is one hour after `iat`. Nothing in the service checks them
//! on incoming requests; `TokenIssuer::verify` is only built for tests.

use std::fmt;
use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BCRYPT_COST: u32 = 10;

/// Token lifetime. Fixed, not configurable.
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("secretOrPrivateKey must have a value")]
    MissingSecret,
    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub async fn hash_password(password: String) -> Result<String, AuthError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST)).await??;
    Ok(hashed)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs login tokens with the server secret. Without a secret every
/// issuance fails, which surfaces as a server error at login.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Option<Arc<str>>,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn issue(&self, user_id: ObjectId) -> Result<String, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    fn issue_at(&self, user_id: ObjectId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let secret = self.secret.as_deref().ok_or(AuthError::MissingSecret)?;
        let iat = now.timestamp();
        let claims = Claims {
            id: user_id.to_hex(),
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?)
    }

    /// Check signature and expiry, returning the embedded claims.
    #[cfg(test)]
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let secret = self.secret.as_deref().ok_or(AuthError::MissingSecret)?;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use anyhow::Result;
    use bson::oid::ObjectId;
    use chrono::{Duration, Utc};

    use super::{hash_password, verify_password, AuthError, TokenIssuer, TOKEN_TTL_SECONDS};

    #[tokio::test]
    async fn hashed_password_differs_from_plaintext_and_verifies() -> Result<()> {
        let hash = hash_password(String::from("hunter2")).await?;

        assert_ne!(hash, "hunter2");
        assert!(hash.starts_with("$2"));
        assert!(verify_password(String::from("hunter2"), hash.clone()).await?);
        assert!(!verify_password(String::from("hunter3"), hash).await?);
        Ok(())
    }

    #[test]
    fn token_round_trips_user_id_with_one_hour_expiry() -> Result<()> {
        let issuer = TokenIssuer::new(Some(String::from("test-secret")));
        let user_id = ObjectId::new();

        let token = issuer.issue(user_id)?;
        let claims = issuer.verify(&token)?;

        assert_eq!(claims.id, user_id.to_hex());
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() -> Result<()> {
        let token = TokenIssuer::new(Some(String::from("a"))).issue(ObjectId::new())?;

        let result = TokenIssuer::new(Some(String::from("b"))).verify(&token);

        assert!(matches!(result, Err(AuthError::Token(_))));
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<()> {
        let issuer = TokenIssuer::new(Some(String::from("test-secret")));
        let issued = Utc::now() - Duration::hours(2);

        let token = issuer.issue_at(ObjectId::new(), issued)?;

        assert!(issuer.verify(&token).is_err());
        Ok(())
    }

    #[test]
    fn missing_or_empty_secret_cannot_issue() {
        assert!(matches!(
            TokenIssuer::new(None).issue(ObjectId::new()),
            Err(AuthError::MissingSecret)
        ));
        assert!(!TokenIssuer::new(Some(String::new())).is_configured());
    }
}
