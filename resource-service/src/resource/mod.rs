//! Resource services: generic CRUD over one model type
//!
//! A [`ResourceService`] ties a [`Resource`] type to a
//! [`ResourceRepository`](crate::repository::ResourceRepository), an optional
//! [`CachePort`](crate::cache::CachePort) and optional [`Hooks`]. Its
//! [`router`](ResourceService::router) mounts the requested
//! [`Action`](crate::action::Action)s on an axum router, each answering with
//! an [`Envelope`].
//!
//! ```rust,ignore
//! use resource_service::prelude::*;
//!
//! let service = Arc::new(ResourceService::new(
//!     ModelDescriptor::<Widget>::new("widget", "widgets"),
//!     Arc::new(InMemoryRepository::new()),
//! ));
//! let app = service.router("/widget", resolve_actions(["read", "Create"])?)?;
//! ```

mod descriptor;
mod envelope;
mod error;
mod handlers;
mod hooks;
mod requests;
mod routes;
mod service;

pub use descriptor::{short_type_name, ModelDescriptor, Resource};
pub use envelope::Envelope;
pub use error::{ApiError, ApiErrorKind};
pub use hooks::{BeforeCreateHook, BeforeDeleteHook, BeforeUpdateHook, FilterHook, Hooks, UpdateInput};
pub use requests::{FilterRequest, IdRequest, PageRequest};
pub use routes::ActionRoute;
pub use service::ResourceService;
