//! Response caching for the GraphQL client
//!
//! - `keys`: query result keys
//! - `policy`: per-type identity rules, including opting out of merging
//! - `store`: the normalized in-memory store

pub mod keys;
pub mod policy;
pub mod store;

pub use keys::QueryKey;
pub use policy::{CacheConfig, KeyFields, TypePolicy, TYPENAME_FIELD};
pub use store::{NormalizedCache, REF_FIELD};
