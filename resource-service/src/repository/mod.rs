//! Repository Port: the persistence boundary of the resource layer
//!
//! The resource layer never talks to a database directly. It drives a
//! [`ResourceRepository`] implementation for one model type, passing filter
//! sets and page positions built from client requests.
//!
//! # Features
//!
//! - **Port trait**: [`ResourceRepository`] for get, first, list, page, create,
//!   update, partial update, soft delete, restore and hard delete
//! - **Filtering**: [`FilterCondition`] terms read as a conjunction
//! - **Pagination**: [`PageQuery`] in, [`Page`] with [`Pagination`] metadata out
//! - **Errors**: [`RepositoryError`] carrying operation and entity context
//! - **In-memory adapter**: [`InMemoryRepository`] with per-operation call counts
//!
//! # Example
//!
//! ```rust,ignore
//! use resource_service::repository::{FilterCondition, InMemoryRepository, ResourceRepository};
//!
//! let repo = InMemoryRepository::<Widget>::new();
//! repo.create(Widget { id: 0, name: "x".into() }).await?;
//!
//! let named = repo.list(&[FilterCondition::like("name", "x%")]).await?;
//! assert_eq!(named.len(), 1);
//! ```

mod error;
mod filter;
mod memory;
mod pagination;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use filter::{FilterCondition, FilterOperator, FilterValue};
pub use memory::{InMemoryRepository, RepositoryStats};
pub use pagination::{Page, PageQuery, Pagination};
pub use traits::{RepositoryResult, ResourceRepository};
