//! # resource-service
//!
//! Model-agnostic CRUD resources for axum. Describe a model once, hand it a
//! repository and optionally a cache, and get a router that answers a fixed
//! set of actions with uniform JSON envelopes.
//!
//! ## Features
//!
//! - **Action catalog**: ten symbolic actions with fixed methods and
//!   sub-paths, plus `read` / `write` / `delete` / `admin` / `all` groups
//! - **Repository port**: one async trait per model; an in-memory adapter
//!   ships with the crate
//! - **Cache-aside reads**: fetch-by-id goes through any `CachePort`, and
//!   every write invalidates the row's keys (Redis adapter behind `cache`)
//! - **Hooks**: filter rewriting plus before-create, before-update and
//!   before-delete vetoes with access to the request head
//! - **RPC registry**: start-up enumeration and binding of non-HTTP handlers
//!
//! ## Example
//!
//! ```rust,no_run
//! use resource_service::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Widget {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Resource for Widget {
//!     fn id(&self) -> u64 {
//!         self.id
//!     }
//!
//!     fn set_id(&mut self, id: u64) {
//!         self.id = id;
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let service = Arc::new(
//!         ResourceService::new(
//!             ModelDescriptor::<Widget>::new("widget", "widgets"),
//!             Arc::new(InMemoryRepository::new()),
//!         )
//!         .with_cache(Arc::new(InMemoryCache::new()))
//!         .with_settings(ResourceSettings::from(&config)),
//!     );
//!     let app = service.router("/api/widget", resolve_actions(["all"])?)?;
//!
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.service.port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod cache;
pub mod config;
pub mod error;
pub mod repository;
pub mod resource;
pub mod rpc;

#[cfg(feature = "observability")]
pub mod observability;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::action::{resolve_actions, Action, ActionSet};
    pub use crate::cache::{CacheError, CacheKey, CachePort, InMemoryCache};
    pub use crate::config::{Config, ResourceSettings};
    pub use crate::error::{Error, Result};
    pub use crate::repository::{
        FilterCondition, FilterOperator, FilterValue, InMemoryRepository, Page, PageQuery,
        Pagination, RepositoryError, RepositoryErrorKind, RepositoryResult, ResourceRepository,
    };
    pub use crate::resource::{
        ApiError, ApiErrorKind, Envelope, FilterRequest, Hooks, IdRequest, ModelDescriptor,
        PageRequest, Resource, ResourceService, UpdateInput,
    };
    pub use crate::rpc::{InProcessTransport, RpcAction, RpcHandler, RpcRegistry, RpcTransport};

    #[cfg(feature = "cache")]
    pub use crate::cache::RedisCache;

    #[cfg(feature = "observability")]
    pub use crate::observability::init_tracing;

    pub use axum::Router;
}
