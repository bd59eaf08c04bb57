//! Configuration for graph-gate
//!
//! CLI arguments and environment variable handling using clap. Every value is
//! a plain string from the environment; unset identity values stay `None`.

use std::time::Duration;

use clap::Parser;

use crate::auth::SESSION_COOKIE_NAME;
use crate::cache::CacheConfig;
use crate::factory::{ClientConfig, DEFAULT_ENDPOINT};

/// graph-gate - authenticated GraphQL client
#[derive(Parser, Debug, Clone)]
#[command(name = "graph-gate")]
#[command(about = "Run GraphQL operations with a cookie session and a normalized cache")]
pub struct Args {
    /// GraphQL HTTP endpoint
    #[arg(long, env = "GRAPHQL_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Name of the cookie holding the session token
    #[arg(long, env = "SESSION_COOKIE", default_value = SESSION_COOKIE_NAME)]
    pub session_cookie: String,

    /// Identity provider settings
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Comma-separated typenames whose ids are not globally unique
    /// e.g. "LineItem,Edge"
    #[arg(long, env = "DISABLE_NORMALIZATION")]
    pub disable_normalization: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Raw Cookie header to take the session token from
    #[arg(long)]
    pub cookie: Option<String>,

    /// Session token (takes precedence over --cookie)
    #[arg(long)]
    pub token: Option<String>,

    /// GraphQL document to run
    #[arg(long)]
    pub query: String,

    /// Variables as a JSON object
    #[arg(long)]
    pub variables: Option<String>,

    /// Operation name
    #[arg(long)]
    pub operation_name: Option<String>,

    /// Send as a mutation (no result caching)
    #[arg(long, default_value = "false")]
    pub mutation: bool,
}

/// Identity pool configuration, passed through as-is
#[derive(Parser, Debug, Clone, Default)]
pub struct IdentityArgs {
    /// User pool identifier
    #[arg(long, env = "USER_POOL_ID")]
    pub user_pool_id: Option<String>,

    /// User pool web client identifier
    #[arg(long, env = "USER_POOL_CLIENT_ID")]
    pub user_pool_client_id: Option<String>,

    /// Region of the identity provider
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,
}

impl Args {
    /// Typenames opted out of identity-based merging
    pub fn disabled_typenames(&self) -> Vec<String> {
        self.disable_normalization
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Client settings from this configuration
    pub fn client_config(&self) -> ClientConfig {
        let cache = self
            .disabled_typenames()
            .into_iter()
            .fold(CacheConfig::new(), |cache, name| cache.disable_normalization(name));

        ClientConfig {
            endpoint: self.endpoint.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
            cache,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(format!(
                "GRAPHQL_ENDPOINT must be an http(s) URL, got {}",
                self.endpoint
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.session_cookie.is_empty() {
            return Err("SESSION_COOKIE must not be empty".to_string());
        }

        if let Some(ref vars) = self.variables {
            match serde_json::from_str::<serde_json::Value>(vars) {
                Ok(v) if v.is_object() => {}
                _ => return Err("--variables must be a JSON object".to_string()),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KeyFields;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["graph-gate", "--query", "{ ping }"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_disabled_typenames() {
        let args = parse(&["--disable-normalization", " LineItem, ,Edge "]);
        assert_eq!(args.disabled_typenames(), vec!["LineItem", "Edge"]);

        let config = args.client_config();
        assert_eq!(config.cache.policy_for("Edge"), &KeyFields::Disabled);
        assert_eq!(config.cache.policy_for("User"), &KeyFields::Id);
    }

    #[test]
    fn test_client_config_timeout() {
        let args = parse(&["--request-timeout-ms", "1500", "--endpoint", "https://api.test/graphql"]);
        let config = args.client_config();
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.endpoint, "https://api.test/graphql");
    }

    #[test]
    fn test_validate() {
        assert!(parse(&["--endpoint", "https://api.test/graphql"]).validate().is_ok());
        assert!(parse(&["--endpoint", "ws://api.test"]).validate().is_err());
        assert!(parse(&["--endpoint", "https://a.test", "--request-timeout-ms", "0"])
            .validate()
            .is_err());
        assert!(parse(&["--endpoint", "https://a.test", "--variables", "[1]"])
            .validate()
            .is_err());
        assert!(parse(&["--endpoint", "https://a.test", "--variables", r#"{"id":1}"#])
            .validate()
            .is_ok());
    }
}
