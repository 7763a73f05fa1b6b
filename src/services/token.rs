//! Bearer token service
//!
//! HS256 JWTs whose `sub` claim carries the user id. Tokens are stateless;
//! revocation is out of scope.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Error types for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Failed to issue token: {0}")]
    Issue(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id as a decimal string
    sub: String,
    /// Expiration, seconds since the epoch
    exp: usize,
}

/// Issues and verifies access tokens
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl_hours: i64,
}

impl TokenService {
    /// Create a token service with the given signing secret and lifetime
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }

    /// Issue a token for the given user
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        let expiration = (Utc::now() + Duration::hours(self.ttl_hours)).timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    /// Verify a token and return the user id it was issued for
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        data.claims.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 24)
    }

    #[test]
    fn test_round_trip_identifies_user() {
        let svc = service();
        let token = svc.issue(42).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_rejects_tampered_token() {
        let svc = service();
        let mut token = svc.issue(42).unwrap();
        // Flip a character in the payload segment
        let mid = token.len() / 2;
        let replacement = if token.as_bytes()[mid] == b'a' { 'b' } else { 'a' };
        token.replace_range(mid..mid + 1, &replacement.to_string());
        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = service().issue(42).unwrap();
        let other = TokenService::new("different-secret", 24);
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_rejects_expired_token() {
        let svc = TokenService::new("test-secret", -1);
        let token = svc.issue(42).unwrap();
        assert!(matches!(
            service().verify(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            service().verify("not.a.jwt"),
            Err(TokenError::Invalid)
        ));
    }
}
