//! Signing secret lookup
//!
//! The secret is read straight from the process environment on each call.
//! No strength or format checks happen here.

/// Environment variable holding the token signing secret
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

/// Reads the signing secret from a named environment variable
#[derive(Debug, Clone)]
pub struct SecretAccessor {
    var: String,
}

impl SecretAccessor {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable this accessor reads
    pub fn var(&self) -> &str {
        &self.var
    }

    /// Current secret, or `None` when unset (or not valid unicode)
    pub fn get(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

impl Default for SecretAccessor {
    fn default() -> Self {
        Self::new(SESSION_SECRET_ENV)
    }
}

/// Shorthand for the default accessor
pub fn signing_secret() -> Option<String> {
    SecretAccessor::default().get()
}
