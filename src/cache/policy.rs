//! Per-type identity policies
//!
//! Objects carrying a `__typename` are normalized into shared entity records
//! keyed by `Type:id`. Some types hand out ids that are only unique within a
//! parent (line items, edges, per-owner counters); merging those would fold
//! unrelated records together, so a type can opt out entirely.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::keys::write_canonical;

/// Field carrying the GraphQL type name
pub const TYPENAME_FIELD: &str = "__typename";

/// How identity is derived for a type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyFields {
    /// `id`, falling back to `_id`
    #[default]
    Id,
    /// Composite key from the listed fields, all required
    Fields(Vec<String>),
    /// Never normalize; objects stay inline in their parent
    Disabled,
}

/// Cache policy for one type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypePolicy {
    pub key_fields: KeyFields,
}

/// Cache configuration
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    pub type_policies: HashMap<String, TypePolicy>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt `typename` out of identity-based merging
    pub fn disable_normalization(mut self, typename: impl Into<String>) -> Self {
        self.type_policies.insert(
            typename.into(),
            TypePolicy {
                key_fields: KeyFields::Disabled,
            },
        );
        self
    }

    /// Identify `typename` by the given fields instead of `id`
    pub fn key_fields<I, S>(mut self, typename: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_policies.insert(
            typename.into(),
            TypePolicy {
                key_fields: KeyFields::Fields(fields.into_iter().map(Into::into).collect()),
            },
        );
        self
    }

    /// Policy for a type (default when not configured)
    pub fn policy_for(&self, typename: &str) -> &KeyFields {
        static DEFAULT: KeyFields = KeyFields::Id;
        self.type_policies
            .get(typename)
            .map(|p| &p.key_fields)
            .unwrap_or(&DEFAULT)
    }

    /// Entity key for an object, `None` when it should stay inline
    pub fn identify(&self, object: &Map<String, Value>) -> Option<String> {
        let typename = object.get(TYPENAME_FIELD)?.as_str()?;

        match self.policy_for(typename) {
            KeyFields::Disabled => None,
            KeyFields::Id => {
                let id = object.get("id").or_else(|| object.get("_id"))?;
                Some(format!("{}:{}", typename, id_fragment(id)?))
            }
            KeyFields::Fields(fields) => {
                let mut out = String::from("{");
                for (i, field) in fields.iter().enumerate() {
                    let value = object.get(field)?;
                    if value.is_null() {
                        return None;
                    }
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&Value::String(field.clone()).to_string());
                    out.push(':');
                    write_canonical(value, &mut out);
                }
                out.push('}');
                Some(format!("{}:{}", typename, out))
            }
        }
    }
}

fn id_fragment(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_identify_by_id() {
        let config = CacheConfig::new();
        assert_eq!(
            config.identify(&obj(json!({"__typename": "User", "id": "42"}))),
            Some("User:42".to_string())
        );
        assert_eq!(
            config.identify(&obj(json!({"__typename": "User", "id": 7}))),
            Some("User:7".to_string())
        );
        assert_eq!(
            config.identify(&obj(json!({"__typename": "User", "_id": "x"}))),
            Some("User:x".to_string())
        );
    }

    #[test]
    fn test_identify_requires_typename_and_id() {
        let config = CacheConfig::new();
        assert_eq!(config.identify(&obj(json!({"id": "42"}))), None);
        assert_eq!(config.identify(&obj(json!({"__typename": "User"}))), None);
        assert_eq!(
            config.identify(&obj(json!({"__typename": "User", "id": null}))),
            None
        );
    }

    #[test]
    fn test_disabled_type_not_identified() {
        let config = CacheConfig::new().disable_normalization("LineItem");
        assert_eq!(
            config.identify(&obj(json!({"__typename": "LineItem", "id": "1"}))),
            None
        );
        // Other types unaffected
        assert!(config
            .identify(&obj(json!({"__typename": "Order", "id": "1"})))
            .is_some());
    }

    #[test]
    fn test_composite_key_fields() {
        let config = CacheConfig::new().key_fields("Book", ["isbn", "edition"]);
        assert_eq!(
            config.identify(&obj(json!({"__typename": "Book", "edition": 2, "isbn": "978"}))),
            Some(r#"Book:{"isbn":"978","edition":2}"#.to_string())
        );
        // Missing field means no identity
        assert_eq!(
            config.identify(&obj(json!({"__typename": "Book", "isbn": "978"}))),
            None
        );
    }
}
