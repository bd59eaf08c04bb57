//! GraphQL client bound to one endpoint and one normalized cache

use std::sync::Arc;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{NormalizedCache, QueryKey};
use crate::error::{ClientError, Result};
use crate::types::{FetchPolicy, GraphqlRequest, GraphqlResponse};

/// HTTP client for a GraphQL endpoint
///
/// Built by [`ClientFactory`](crate::factory::ClientFactory); every instance
/// owns its own cache.
///
/// # Example
///
/// ```rust,no_run
/// use graph_gate::{ClientConfig, ClientFactory, FetchPolicy, GraphqlRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let factory = ClientFactory::new(ClientConfig {
///     endpoint: "https://api.example.com/graphql".into(),
///     ..Default::default()
/// })?;
/// let client = factory.create_with_token(Some("session-token".into()))?;
///
/// let data = client
///     .query(&GraphqlRequest::new("{ me { id name } }"), FetchPolicy::CacheFirst)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct GraphqlClient {
    id: Uuid,
    endpoint: Url,
    http: Client,
    authorized: bool,
    cache: Arc<NormalizedCache>,
}

impl GraphqlClient {
    pub(crate) fn new(endpoint: Url, http: Client, authorized: bool, cache: NormalizedCache) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint,
            http,
            authorized,
            cache: Arc::new(cache),
        }
    }

    /// Unique per instance
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether requests carry a bearer token
    pub fn has_token(&self) -> bool {
        self.authorized
    }

    pub fn cache(&self) -> &NormalizedCache {
        &self.cache
    }

    /// Run a query under the given fetch policy
    pub async fn query(&self, request: &GraphqlRequest, policy: FetchPolicy) -> Result<Value> {
        let key = QueryKey::for_request(request);

        match policy {
            FetchPolicy::CacheFirst => {
                if let Some(hit) = self.cache.read_query(&key) {
                    return Ok(hit);
                }
                let data = self.execute(request).await?;
                self.cache.write_query(&key, &data);
                Ok(data)
            }
            FetchPolicy::NetworkOnly => {
                let data = self.execute(request).await?;
                self.cache.write_query(&key, &data);
                Ok(data)
            }
            FetchPolicy::CacheOnly => self
                .cache
                .read_query(&key)
                .ok_or_else(|| ClientError::CacheMiss(key.to_string())),
            FetchPolicy::NoCache => self.execute(request).await,
        }
    }

    /// Run a mutation; returned entities are merged into the cache
    pub async fn mutate(&self, request: &GraphqlRequest) -> Result<Value> {
        let data = self.execute(request).await?;
        self.cache.write_entities(&data);
        Ok(data)
    }

    async fn execute(&self, request: &GraphqlRequest) -> Result<Value> {
        debug!(
            "POST {} operation={}",
            self.endpoint,
            request.operation_name.as_deref().unwrap_or("anonymous")
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status,
                message: body,
            });
        }

        let bytes = response.bytes().await?;
        let body: GraphqlResponse = serde_json::from_slice(&bytes)?;

        if !body.errors.is_empty() {
            return Err(ClientError::Graphql(body.errors));
        }

        body.data
            .ok_or_else(|| ClientError::InvalidResponse("response has no data".to_string()))
    }
}
