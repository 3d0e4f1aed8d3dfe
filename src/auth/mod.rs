use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod password;

/// Name of the HTTP-only session cookie
pub const SESSION_COOKIE: &str = "token";

/// Session failures, all surfaced to clients as 401 except internal ones
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no session token provided")]
    MissingToken,

    #[error("session token invalid or malformed")]
    InvalidToken,

    #[error("session token expired")]
    ExpiredToken,

    #[error("session token references an unknown user")]
    UserNotFound,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token generation failed: {0}")]
    TokenGeneration(String),
}

/// JWT claims for a session token. The token is the only session state;
/// nothing is persisted server-side, so validity is purely signature + expiry.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id the session is bound to
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, expiry_days: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + Duration::days(expiry_days)).timestamp(),
        }
    }
}

/// Mint a signed session token for a user
pub fn issue_token(user_id: Uuid, secret: &str, expiry_days: i64) -> Result<String, AuthError> {
    let claims = Claims::new(user_id, expiry_days);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, resolving the bound user id
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let validation = Validation::default();
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })?;
    Ok(data.claims.sub)
}
