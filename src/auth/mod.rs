//! Session credentials
//!
//! Provides:
//! - Cookie-based session token lookup (document and request side)
//! - Signing secret access from the environment
//! - HS256 token signing and verification

pub mod cookie;
pub mod jwt;
pub mod secret;

pub use cookie::{parse_cookie, DocumentCookies, TokenStore, SESSION_COOKIE_NAME};
pub use jwt::{extract_token_from_header, AuthError, Claims, JwtValidator, TokenValidationResult};
pub use secret::{signing_secret, SecretAccessor, SESSION_SECRET_ENV};
