//! Normalized in-memory result cache
//!
//! Writes split a response into entity records (merged field by field under
//! their identity key) and a root that points at them. References live in an
//! internal node type, so no shape of server data can be mistaken for one.
//! Reads resolve them again, so an entity updated by one operation shows up in
//! every cached result that references it.
//!
//! Storage is unbounded; nothing is evicted unless asked.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::debug;

use super::keys::QueryKey;
use super::policy::CacheConfig;

/// Marker field used when a reference is rendered as JSON (snapshots, cycles)
pub const REF_FIELD: &str = "__ref";

type Fields = BTreeMap<String, Node>;

/// Normalized value
#[derive(Debug, Clone)]
enum Node {
    Ref(String),
    Object(Fields),
    List(Vec<Node>),
    Scalar(Value),
}

/// Normalized cache of query results
pub struct NormalizedCache {
    config: CacheConfig,
    /// Entity records by identity key
    entities: DashMap<String, Fields>,
    /// Normalized query roots by storage key
    results: DashMap<String, Node>,
}

impl NormalizedCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entities: DashMap::new(),
            results: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Entity key for an object under this cache's policies
    pub fn identify(&self, object: &Map<String, Value>) -> Option<String> {
        self.config.identify(object)
    }

    /// Store a query result
    pub fn write_query(&self, key: &QueryKey, data: &Value) {
        let root = self.normalize(data);
        debug!("Cache write {} ({} entities)", key, self.entities.len());
        self.results.insert(key.to_storage_key(), root);
    }

    /// Merge entities from `data` without storing a query root
    pub fn write_entities(&self, data: &Value) {
        self.normalize(data);
    }

    /// Read a complete query result, `None` on miss or dangling reference
    pub fn read_query(&self, key: &QueryKey) -> Option<Value> {
        let root = self.results.get(&key.to_storage_key())?.value().clone();
        let mut path = Vec::new();
        let resolved = self.resolve(&root, &mut path);
        match &resolved {
            Some(_) => debug!("Cache hit {}", key),
            None => debug!("Cache incomplete {}", key),
        }
        resolved
    }

    /// Raw entity record, references rendered as `{"__ref": key}`
    pub fn entity(&self, key: &str) -> Option<Map<String, Value>> {
        self.entities.get(key).map(|e| raw_fields(e.value()))
    }

    /// Remove an entity record; results referencing it become misses
    pub fn evict(&self, key: &str) -> bool {
        self.entities.remove(key).is_some()
    }

    /// Snapshot of all entity records
    pub fn extract(&self) -> Value {
        let map: Map<String, Value> = self
            .entities
            .iter()
            .map(|e| (e.key().clone(), Value::Object(raw_fields(e.value()))))
            .collect();
        Value::Object(map)
    }

    /// Drop everything
    pub fn reset(&self) {
        self.entities.clear();
        self.results.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.results.is_empty()
    }

    fn normalize(&self, value: &Value) -> Node {
        match value {
            Value::Array(items) => Node::List(items.iter().map(|v| self.normalize(v)).collect()),
            Value::Object(object) => {
                let fields: Fields = object
                    .iter()
                    .map(|(k, v)| (k.clone(), self.normalize(v)))
                    .collect();

                match self.config.identify(object) {
                    Some(key) => {
                        self.entities
                            .entry(key.clone())
                            .or_default()
                            .extend(fields);
                        Node::Ref(key)
                    }
                    None => Node::Object(fields),
                }
            }
            other => Node::Scalar(other.clone()),
        }
    }

    fn resolve(&self, node: &Node, path: &mut Vec<String>) -> Option<Value> {
        match node {
            Node::List(items) => items
                .iter()
                .map(|v| self.resolve(v, path))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Node::Ref(key) => {
                if path.iter().any(|k| k == key) {
                    // Cycle back to an entity already being resolved
                    return Some(reference(key));
                }
                let entity = self.entities.get(key)?.value().clone();
                path.push(key.clone());
                let resolved = self.resolve_fields(&entity, path);
                path.pop();
                resolved
            }
            Node::Object(fields) => self.resolve_fields(fields, path),
            Node::Scalar(value) => Some(value.clone()),
        }
    }

    fn resolve_fields(&self, fields: &Fields, path: &mut Vec<String>) -> Option<Value> {
        let mut out = Map::with_capacity(fields.len());
        for (k, v) in fields {
            out.insert(k.clone(), self.resolve(v, path)?);
        }
        Some(Value::Object(out))
    }
}

impl Default for NormalizedCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn reference(key: &str) -> Value {
    let mut map = Map::new();
    map.insert(REF_FIELD.to_string(), Value::String(key.to_string()));
    Value::Object(map)
}

fn raw(node: &Node) -> Value {
    match node {
        Node::Ref(key) => reference(key),
        Node::Object(fields) => Value::Object(raw_fields(fields)),
        Node::List(items) => Value::Array(items.iter().map(raw).collect()),
        Node::Scalar(value) => value.clone(),
    }
}

fn raw_fields(fields: &Fields) -> Map<String, Value> {
    fields.iter().map(|(k, v)| (k.clone(), raw(v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(q: &str) -> QueryKey {
        QueryKey::new(q, None, None)
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = NormalizedCache::default();
        assert!(cache.is_empty());
        assert_eq!(cache.entity_count(), 0);
        assert_eq!(cache.result_count(), 0);
    }

    #[test]
    fn test_write_then_read() {
        let cache = NormalizedCache::default();
        let data = json!({"me": {"__typename": "User", "id": "1", "name": "Ada"}});
        cache.write_query(&key("me"), &data);

        assert_eq!(cache.read_query(&key("me")), Some(data));
        assert_eq!(cache.entity_count(), 1);
        assert_eq!(cache.entity("User:1").unwrap()["name"], "Ada");
    }

    #[test]
    fn test_read_miss() {
        let cache = NormalizedCache::default();
        assert_eq!(cache.read_query(&key("nothing")), None);
    }

    #[test]
    fn test_entities_shared_across_queries() {
        let cache = NormalizedCache::default();
        cache.write_query(
            &key("me"),
            &json!({"me": {"__typename": "User", "id": "1", "name": "Ada"}}),
        );
        cache.write_query(
            &key("user"),
            &json!({"user": {"__typename": "User", "id": "1", "name": "Ada Lovelace"}}),
        );

        // The later write is visible through the earlier query
        let me = cache.read_query(&key("me")).unwrap();
        assert_eq!(me["me"]["name"], "Ada Lovelace");
        assert_eq!(cache.entity_count(), 1);
    }

    #[test]
    fn test_merge_keeps_existing_fields() {
        let cache = NormalizedCache::default();
        cache.write_entities(&json!({"__typename": "User", "id": "1", "name": "Ada"}));
        cache.write_entities(&json!({"__typename": "User", "id": "1", "email": "ada@x"}));

        let user = cache.entity("User:1").unwrap();
        assert_eq!(user["name"], "Ada");
        assert_eq!(user["email"], "ada@x");
    }

    #[test]
    fn test_disabled_type_not_merged() {
        let cache = NormalizedCache::new(CacheConfig::new().disable_normalization("Comment"));
        let data = json!({
            "a": {"__typename": "Comment", "id": "1", "body": "first"},
            "b": {"__typename": "Comment", "id": "1", "body": "second"}
        });
        cache.write_query(&key("comments"), &data);

        assert_eq!(cache.entity_count(), 0);
        let read = cache.read_query(&key("comments")).unwrap();
        assert_eq!(read["a"]["body"], "first");
        assert_eq!(read["b"]["body"], "second");
    }

    #[test]
    fn test_default_policy_merges_same_id() {
        let cache = NormalizedCache::default();
        let data = json!({
            "a": {"__typename": "Comment", "id": "1", "body": "first"},
            "b": {"__typename": "Comment", "id": "1", "body": "second"}
        });
        cache.write_query(&key("comments"), &data);

        let read = cache.read_query(&key("comments")).unwrap();
        assert_eq!(read["a"]["body"], "second");
    }

    #[test]
    fn test_nested_lists() {
        let cache = NormalizedCache::default();
        let data = json!({
            "posts": [
                {"__typename": "Post", "id": 1, "author": {"__typename": "User", "id": "u"}},
                {"__typename": "Post", "id": 2, "author": {"__typename": "User", "id": "u"}}
            ]
        });
        cache.write_query(&key("posts"), &data);

        assert_eq!(cache.entity_count(), 3);
        assert_eq!(cache.read_query(&key("posts")), Some(data));
    }

    #[test]
    fn test_evicted_entity_makes_result_incomplete() {
        let cache = NormalizedCache::default();
        cache.write_query(&key("me"), &json!({"me": {"__typename": "User", "id": "1"}}));

        assert!(cache.evict("User:1"));
        assert!(!cache.evict("User:1"));
        assert_eq!(cache.read_query(&key("me")), None);
    }

    #[test]
    fn test_cycle_terminates() {
        let cache = NormalizedCache::default();
        cache.write_entities(&json!({
            "__typename": "User", "id": "a",
            "friend": {"__typename": "User", "id": "b",
                "friend": {"__typename": "User", "id": "a"}}
        }));
        cache.write_query(&key("a"), &json!({"user": {"__typename": "User", "id": "a"}}));

        let read = cache.read_query(&key("a")).unwrap();
        assert_eq!(read["user"]["friend"]["id"], "b");
        assert_eq!(read["user"]["friend"]["friend"]["__ref"], "User:a");
    }

    #[test]
    fn test_ref_shaped_payload_is_plain_data() {
        let cache = NormalizedCache::default();
        cache.write_entities(&json!({"__typename": "User", "id": "1", "name": "Ada"}));

        let data = json!({
            "blob": {"__ref": "x"},
            "other": {"__ref": "User:1"}
        });
        cache.write_query(&key("blob"), &data);

        assert_eq!(cache.read_query(&key("blob")), Some(data));
    }

    #[test]
    fn test_extract_and_reset() {
        let cache = NormalizedCache::default();
        cache.write_query(&key("me"), &json!({"me": {"__typename": "User", "id": "1"}}));

        let snapshot = cache.extract();
        assert!(snapshot.get("User:1").is_some());

        cache.reset();
        assert!(cache.is_empty());
    }
}
