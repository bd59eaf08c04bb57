//! graph-gate - authenticated GraphQL client bootstrap
//!
//! Reads a session token from cookies, builds a GraphQL client bound to a
//! single configured endpoint, and keeps that client in a registry owned by
//! the caller's context.
//!
//! ## Components
//!
//! - **Auth**: cookie token lookup, signing secret access, token verification
//! - **Cache**: normalized in-memory results with per-type identity policies
//! - **Factory**: builds independent clients for the configured endpoint
//! - **Registry**: one client per context, passed explicitly
//! - **Debounce**: trailing-edge debounce helper

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod debounce;
pub mod error;
pub mod factory;
pub mod registry;
pub mod types;

pub use client::GraphqlClient;
pub use config::Args;
pub use context::AppContext;
pub use debounce::Debouncer;
pub use error::{ClientError, Result};
pub use factory::{ClientConfig, ClientFactory};
pub use registry::ClientRegistry;
pub use types::{FetchPolicy, GraphqlRequest, GraphqlResponse};
