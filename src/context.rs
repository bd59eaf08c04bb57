//! Per-context wiring of credentials and the GraphQL client
//!
//! One `AppContext` per runtime context: the token store supplies the
//! credential, the factory runs once, and the registry keeps the result.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::warn;

use crate::auth::{Claims, JwtValidator, SecretAccessor, TokenStore};
use crate::client::GraphqlClient;
use crate::config::Args;
use crate::error::Result;
use crate::factory::ClientFactory;
use crate::registry::ClientRegistry;

pub struct AppContext {
    factory: ClientFactory,
    tokens: TokenStore,
    secrets: SecretAccessor,
    registry: ClientRegistry,
}

impl AppContext {
    pub fn new(factory: ClientFactory, tokens: TokenStore, secrets: SecretAccessor) -> Self {
        Self {
            factory,
            tokens,
            secrets,
            registry: ClientRegistry::new(),
        }
    }

    /// Build from parsed configuration
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self::new(
            ClientFactory::new(args.client_config())?,
            TokenStore::new(args.session_cookie.clone()),
            SecretAccessor::default(),
        ))
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn factory(&self) -> &ClientFactory {
        &self.factory
    }

    /// The context's client, created on first use with `token`
    ///
    /// Later calls return the registered client regardless of `token`.
    pub async fn client(&self, token: Option<String>) -> Result<Arc<GraphqlClient>> {
        self.registry
            .get_or_init(|| self.factory.create_with_token(token))
            .await
    }

    /// Bootstrap using the session cookie of an incoming request
    pub async fn request_client(&self, headers: &HeaderMap) -> Result<Arc<GraphqlClient>> {
        self.client(self.tokens.from_request(headers)).await
    }

    /// Verifier for the configured secret, `None` when unset
    pub fn verifier(&self) -> Option<JwtValidator> {
        JwtValidator::from_accessor(&self.secrets)
    }

    /// Claims of a valid session cookie, `None` when absent or invalid
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<Claims> {
        let token = self.tokens.from_request(headers)?;
        let verifier = self.verifier()?;
        let result = verifier.verify_token(&token);
        if !result.valid {
            warn!(
                "Rejected session token: {}",
                result.error.as_deref().unwrap_or("unknown")
            );
        }
        result.claims
    }
}
