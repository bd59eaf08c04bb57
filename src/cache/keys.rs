//! Cache key definitions
//!
//! Query results are stored under a hash of the operation text and its
//! variables. Entity records use `Type:id` keys (see `policy`).

use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::GraphqlRequest;

/// Cache key for a query result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    /// Operation name, when given (display only)
    pub operation_name: Option<String>,
    /// Hash of query text plus variables
    pub hash: String,
}

impl QueryKey {
    /// Create a new query key
    pub fn new(query: &str, variables: Option<&Value>, operation_name: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(query.as_bytes());
        hasher.update([0u8]);
        if let Some(vars) = variables {
            let mut canonical = String::new();
            write_canonical(vars, &mut canonical);
            hasher.update(canonical.as_bytes());
        }
        let hash = hasher.finalize();

        Self {
            operation_name: operation_name.map(str::to_string),
            hash: hex::encode(&hash[..16]),
        }
    }

    /// Key for a request envelope
    pub fn for_request(request: &GraphqlRequest) -> Self {
        Self::new(
            &request.query,
            request.variables.as_ref(),
            request.operation_name.as_deref(),
        )
    }

    /// Convert to storage key string
    pub fn to_storage_key(&self) -> String {
        format!("query:{}", self.hash)
    }
}

/// Serialize with object keys sorted, independent of map ordering
pub(crate) fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation_name {
            Some(name) => write!(f, "{}({})", name, &self.hash[..8]),
            None => write!(f, "anonymous({})", &self.hash[..8]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_key_deterministic() {
        let k1 = QueryKey::new("{ me { id } }", Some(&json!({"a": 1, "b": 2})), None);
        let k2 = QueryKey::new("{ me { id } }", Some(&json!({"b": 2, "a": 1})), None);
        assert_eq!(k1, k2);
        assert_eq!(k1.to_storage_key(), k2.to_storage_key());
    }

    #[test]
    fn test_different_variables_different_keys() {
        let k1 = QueryKey::new("q", Some(&json!({"id": "1"})), None);
        let k2 = QueryKey::new("q", Some(&json!({"id": "2"})), None);
        assert_ne!(k1.hash, k2.hash);
    }

    #[test]
    fn test_no_variables_differs_from_empty_object() {
        let k1 = QueryKey::new("q", None, None);
        let k2 = QueryKey::new("q", Some(&json!({})), None);
        assert_ne!(k1.hash, k2.hash);
    }

    #[test]
    fn test_display() {
        let key = QueryKey::new("query Me { me { id } }", None, Some("Me"));
        assert!(format!("{}", key).starts_with("Me("));
        let anon = QueryKey::new("{ ping }", None, None);
        assert!(format!("{}", anon).starts_with("anonymous("));
    }
}
