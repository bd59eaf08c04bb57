//! GraphQL client construction
//!
//! The endpoint comes from a single configuration source. Each call builds an
//! independent client with an empty cache; keeping one per context is the
//! registry's job.

use std::time::Duration;

use reqwest::{header, Client, Url};
use tracing::info;

use crate::cache::{CacheConfig, NormalizedCache};
use crate::client::GraphqlClient;
use crate::error::{ClientError, Result};

/// Endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";

/// Client construction settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL HTTP endpoint
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Cache identity policies
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            cache: CacheConfig::default(),
        }
    }
}

/// Builds GraphQL clients for a fixed endpoint
#[derive(Debug, Clone)]
pub struct ClientFactory {
    endpoint: Url,
    config: ClientConfig,
}

impl ClientFactory {
    /// Validate the endpoint and keep the config
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = parse_endpoint(&config.endpoint)?;
        Ok(Self { endpoint, config })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// New unauthenticated client
    pub fn create(&self) -> Result<GraphqlClient> {
        self.create_with_token(None)
    }

    /// New client sending `token` as a bearer credential when present
    pub fn create_with_token(&self, token: Option<String>) -> Result<GraphqlClient> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref token) = token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(self.config.timeout)
            .build()?;

        let client = GraphqlClient::new(
            self.endpoint.clone(),
            http,
            token.is_some(),
            NormalizedCache::new(self.config.cache.clone()),
        );
        info!(
            "Created GraphQL client {} for {} (authenticated: {})",
            client.id(),
            self.endpoint,
            client.has_token()
        );
        Ok(client)
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidEndpoint(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidEndpoint(format!(
            "{raw}: unsupported scheme {other}"
        ))),
    }
}
