//! Credential and token service.
//!
//! Credentials are hashed with Argon2id; sessions are signed bearer tokens
//! (HS256) carrying the user id and role with a fixed one-hour expiry.
//! Forced logout is the token expiring, not server-side session state:
//! protected routes trust a validated token's claims and never re-verify
//! credentials per request.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Fixed token lifetime.
const TOKEN_TTL_HOURS: i64 = 1;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id
    pub sub: Uuid,

    /// `user` or `admin`
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and validates signed bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for a freshly authenticated user.
    pub fn issue(&self, user_id: Uuid, role: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AppError::Internal(format!("token encoding failed: {err}")))
    }

    /// Validate a token's signature and expiry and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AppError> {
        decode::<TokenClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }
}

/// Hash a login PIN with Argon2id and a random salt.
pub fn hash_pin(pin: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Internal(format!("credential hashing failed: {err}")))
}

/// Check a login PIN against a stored hash.
///
/// A malformed stored hash counts as a mismatch rather than an error; the
/// caller reports both the same way.
pub fn verify_pin(pin: &str, pin_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(pin_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_pin("4444").expect("hashing failed");

        assert!(hash.starts_with("$argon2"));
        assert!(verify_pin("4444", &hash));
        assert!(!verify_pin("1234", &hash));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_pin("4444", "not-a-hash"));
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let tokens = TokenService::new("test-secret");
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id, "admin").expect("issue failed");
        let claims = tokens.verify(&token).expect("verify failed");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new("secret-a");
        let verifier = TokenService::new("secret-b");

        let token = issuer.issue(Uuid::new_v4(), "user").expect("issue failed");

        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("test-secret");
        let now = Utc::now();

        // Expired well past the default validation leeway
        let claims = TokenClaims {
            sub: Uuid::new_v4(),
            role: "user".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("encode failed");

        assert!(matches!(tokens.verify(&token), Err(AppError::InvalidToken)));
    }
}
