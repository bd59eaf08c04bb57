//! Holder for the client of one context
//!
//! A registry is an ordinary value owned by whoever sets up a context (a
//! process, a request scope, a test) and passed down explicitly. Two
//! registries never share a client.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::GraphqlClient;
use crate::error::Result;

/// Keeps at most one GraphQL client
#[derive(Default)]
pub struct ClientRegistry {
    client: RwLock<Option<Arc<GraphqlClient>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `client`, replacing any previous one
    pub async fn set(&self, client: Arc<GraphqlClient>) {
        let mut slot = self.client.write().await;
        if let Some(previous) = slot.as_ref() {
            debug!("Replacing registered client {}", previous.id());
        }
        info!("Registered GraphQL client {}", client.id());
        *slot = Some(client);
    }

    /// Current client, if any
    pub async fn get(&self) -> Option<Arc<GraphqlClient>> {
        self.client.read().await.clone()
    }

    /// Current client, or the one built by `init` when empty
    ///
    /// `init` runs under the write lock, so concurrent callers share one
    /// instance. A failed `init` leaves the registry empty.
    pub async fn get_or_init<F>(&self, init: F) -> Result<Arc<GraphqlClient>>
    where
        F: FnOnce() -> Result<GraphqlClient>,
    {
        if let Some(existing) = self.get().await {
            return Ok(existing);
        }

        let mut slot = self.client.write().await;
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }
        let client = Arc::new(init()?);
        info!("Registered GraphQL client {}", client.id());
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Remove the current client
    pub async fn clear(&self) -> Option<Arc<GraphqlClient>> {
        self.client.write().await.take()
    }
}
