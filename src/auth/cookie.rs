//! Session token lookup from cookies
//!
//! Two accessors read the same cookie name:
//! - document side: the raw `document.cookie` string, which may not exist
//!   (e.g. a render pass outside a browser)
//! - request side: the `Cookie` headers of an incoming request
//!
//! A missing cookie is the "unauthenticated" signal, never an error.

use reqwest::header::{HeaderMap, COOKIE};

/// Cookie holding the session token
pub const SESSION_COOKIE_NAME: &str = "token";

/// Raw cookie jar string as exposed by a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentCookies(String);

impl DocumentCookies {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reads the session token from either side
#[derive(Debug, Clone)]
pub struct TokenStore {
    cookie_name: String,
}

impl TokenStore {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Document-side accessor. `None` for `document` means no document exists.
    pub fn from_document(&self, document: Option<&DocumentCookies>) -> Option<String> {
        let document = document?;
        parse_cookie(document.as_str(), &self.cookie_name).map(str::to_string)
    }

    /// Request-side accessor. Scans every `Cookie` header in order.
    ///
    /// Header bytes are decoded lossily, so a non-ASCII neighbouring cookie
    /// does not hide the session token.
    pub fn from_request(&self, headers: &HeaderMap) -> Option<String> {
        headers.get_all(COOKIE).iter().find_map(|v| {
            let raw = String::from_utf8_lossy(v.as_bytes());
            parse_cookie(&raw, &self.cookie_name).map(str::to_string)
        })
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(SESSION_COOKIE_NAME)
    }
}

/// Find `name` in a `k=v; k2=v2` cookie string.
///
/// The value is everything after the first `=`, returned verbatim.
pub fn parse_cookie<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    raw.split(';')
        .map(str::trim_start)
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
