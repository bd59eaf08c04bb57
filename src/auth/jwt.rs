//! Session token signing and verification (HS256)

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::secret::SecretAccessor;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiry, seconds since epoch
    pub exp: u64,
    /// Issued at, seconds since epoch
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Outcome of verifying a token
#[derive(Debug, Clone)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

impl TokenValidationResult {
    fn ok(claims: Claims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies session tokens with a shared secret
pub struct JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Build from the configured secret, `None` when it is unset
    pub fn from_accessor(accessor: &SecretAccessor) -> Option<Self> {
        accessor.get().map(|secret| Self::new(&secret))
    }

    /// Verify signature and expiry
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => TokenValidationResult::ok(data.claims),
            Err(e) => {
                debug!("Token rejected: {}", e);
                TokenValidationResult::rejected(e.to_string())
            }
        }
    }

    /// Sign a token for `subject` valid for `ttl`
    pub fn issue_token(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        let now = unix_now();
        let claims = Claims {
            sub: subject.to_string(),
            exp: now + ttl.as_secs(),
            iat: now,
            email: None,
            username: None,
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }
}

/// Strip the `Bearer ` prefix from an Authorization header value
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let jwt = JwtValidator::new("test-secret");
        let token = jwt.issue_token("user-1", Duration::from_secs(600)).unwrap();

        let result = jwt.verify_token(&token);
        assert!(result.valid);
        assert_eq!(result.claims.unwrap().sub, "user-1");
        assert!(result.error.is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtValidator::new("one")
            .issue_token("user-1", Duration::from_secs(600))
            .unwrap();

        let result = JwtValidator::new("two").verify_token(&token);
        assert!(!result.valid);
        assert!(result.claims.is_none());
        assert!(result.error.is_some());
    }

    #[test]
    fn test_expired_rejected() {
        let jwt = JwtValidator::new("test-secret");
        let now = unix_now();
        let token = jwt
            .sign(&Claims {
                sub: "user-1".into(),
                exp: now - 3600,
                iat: now - 7200,
                email: None,
                username: None,
            })
            .unwrap();

        assert!(!jwt.verify_token(&token).valid);
    }

    #[test]
    fn test_garbage_rejected() {
        let jwt = JwtValidator::new("test-secret");
        assert!(!jwt.verify_token("not-a-token").valid);
        assert!(!jwt.verify_token("").valid);
    }

    #[test]
    fn test_from_accessor_unset() {
        let accessor = SecretAccessor::new("GRAPH_GATE_TEST_JWT_UNSET");
        std::env::remove_var(accessor.var());
        assert!(JwtValidator::from_accessor(&accessor).is_none());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_token_from_header(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_token_from_header(Some("Basic abc")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
