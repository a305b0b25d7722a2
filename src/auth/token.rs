//! Bearer token issuing and verification.
//!
//! Tokens are stateless HS256 credentials carrying `{id, username, role}` and
//! an expiry. The signing secret is injected at construction and shared
//! identically by the issuer (auth-service) and every verifier; there is no
//! revocation list, so a token stays valid for its full signed lifetime.
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Role;

/// Default token lifetime in seconds (one hour).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// The claim set embedded in a signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub exp: i64,
}

/// A verified identity, attached to a request for its duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            id: claims.id,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Credential validation failures. The two variants map to distinct status
/// codes: a missing header is a 401, a present-but-bad token is a 403.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("no token provided")]
    Missing,
    #[error("failed to authenticate token")]
    Invalid,
}

/// Issues and verifies bearer tokens with a shared HS256 secret.
///
/// The secret is an explicit constructor argument so each service wires its
/// own instance from configuration; nothing here is process-global.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is valid for precisely its signed lifetime.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Sign a token for the given identity with this service's lifetime.
    pub fn issue(
        &self,
        id: i64,
        username: &str,
        role: Role,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            id,
            username: username.to_string(),
            role,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Verify signature and expiry of a raw token string.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|err| {
                tracing::debug!(error = %err, "token verification failed");
                TokenError::Invalid
            })
    }

    /// Validate a raw `Authorization` header value of the form
    /// `Bearer <token>`. An absent header is [`TokenError::Missing`]; a
    /// present header of any other shape, or a bad token, is
    /// [`TokenError::Invalid`].
    pub fn authenticate(&self, header: Option<&str>) -> Result<Identity, TokenError> {
        let header = header.ok_or(TokenError::Missing)?;
        let token = header.strip_prefix("Bearer ").ok_or(TokenError::Invalid)?;
        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret", DEFAULT_TOKEN_TTL_SECS)
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let tokens = service();
        let token = tokens.issue(7, "alice", Role::Nurse).unwrap();
        let identity = tokens.verify(&token).unwrap();
        assert_eq!(
            identity,
            Identity {
                id: 7,
                username: "alice".to_string(),
                role: Role::Nurse,
            }
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("unit-test-secret", -120);
        let token = tokens.issue(1, "bob", Role::Doctor).unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().issue(1, "bob", Role::Doctor).unwrap();
        let other = TokenService::new("some-other-secret", DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_authenticate_header_shapes() {
        let tokens = service();
        let token = tokens.issue(3, "carol", Role::Admin).unwrap();

        assert_eq!(tokens.authenticate(None), Err(TokenError::Missing));
        assert_eq!(
            tokens.authenticate(Some("garbage")),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            tokens.authenticate(Some("Bearer not-a-token")),
            Err(TokenError::Invalid)
        );
        let identity = tokens
            .authenticate(Some(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(identity.username, "carol");
    }
}
