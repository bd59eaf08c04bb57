//! GraphQL-over-HTTP request and response envelopes

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GraphQL operation as POSTed to the endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphqlRequest {
    /// Create a request with no variables
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    /// Attach variables
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Attach an operation name
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Response envelope returned by a GraphQL server
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

/// A single entry of the `errors` array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphqlErrorEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// How a query consults the cache and the network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Serve from cache when complete, otherwise fetch and store
    #[default]
    CacheFirst,
    /// Always fetch, then store
    NetworkOnly,
    /// Never fetch; a missing result is an error
    CacheOnly,
    /// Always fetch and never store
    NoCache,
}
