//! Repository port definition
//!
//! The resource layer depends on this trait only. It uses RPITIT
//! (Return Position Impl Trait In Traits) so implementations can write plain
//! `async fn` bodies.
//!
//! # Example
//!
//! ```rust,ignore
//! use resource_service::repository::{FilterCondition, Page, PageQuery, RepositoryResult, ResourceRepository};
//!
//! struct WidgetRepository {
//!     pool: PgPool,
//! }
//!
//! impl ResourceRepository<Widget> for WidgetRepository {
//!     async fn get(&self, id: u64, preloads: &[String]) -> RepositoryResult<Option<Widget>> {
//!         sqlx::query_as!(Widget, "SELECT * FROM widgets WHERE id = $1 AND deleted_at IS NULL", id as i64)
//!             .fetch_optional(&self.pool)
//!             .await
//!             .map_err(into_repository_error)
//!     }
//!     // ... other methods
//! }
//! ```

use std::future::Future;

use serde_json::{Map, Value};

use super::error::RepositoryError;
use super::filter::FilterCondition;
use super::pagination::{Page, PageQuery};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Persistence port for one model type `M`
///
/// Rows are addressed by a non-negative integer primary key. Reads other
/// than [`restore`](Self::restore) ignore soft-deleted rows. Implementations
/// must tolerate unbounded concurrent calls; connection pooling and locking
/// are theirs to own.
pub trait ResourceRepository<M>: Send + Sync + 'static {
    /// Fetch one row by primary key, eagerly attaching the named relations
    ///
    /// Returns `Ok(None)` if no visible row has that id.
    fn get(
        &self,
        id: u64,
        preloads: &[String],
    ) -> impl Future<Output = RepositoryResult<Option<M>>> + Send;

    /// Fetch the first row matching every filter, in primary key order
    fn first(
        &self,
        filters: &[FilterCondition],
    ) -> impl Future<Output = RepositoryResult<Option<M>>> + Send;

    /// Fetch every row matching the filter set
    ///
    /// There is no implicit limit.
    fn list(
        &self,
        filters: &[FilterCondition],
    ) -> impl Future<Output = RepositoryResult<Vec<M>>> + Send;

    /// Fetch one page of rows matching the filter set
    ///
    /// A page index past the last page yields an empty page, not an error.
    fn page(
        &self,
        filters: &[FilterCondition],
        query: PageQuery,
    ) -> impl Future<Output = RepositoryResult<Page<M>>> + Send;

    /// Insert a new row and return it with generated fields filled in
    fn create(&self, model: M) -> impl Future<Output = RepositoryResult<M>> + Send;

    /// Replace the row with primary key `id`
    fn update(&self, id: u64, model: M) -> impl Future<Output = RepositoryResult<M>> + Send;

    /// Merge only the supplied fields into the row with primary key `id`
    ///
    /// `base` is the row as freshly read by the caller.
    fn update_fields(
        &self,
        id: u64,
        base: &M,
        fields: Map<String, Value>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Mark the row as deleted and return it
    fn soft_delete(&self, id: u64) -> impl Future<Output = RepositoryResult<M>> + Send;

    /// Clear the soft-delete mark and return the row
    fn restore(&self, id: u64) -> impl Future<Output = RepositoryResult<M>> + Send;

    /// Remove the row permanently
    fn hard_delete(&self, id: u64) -> impl Future<Output = RepositoryResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Pagination, RepositoryOperation};

    #[derive(Debug, Clone, PartialEq)]
    struct MockEntity {
        id: u64,
    }

    struct MockRepository;

    impl ResourceRepository<MockEntity> for MockRepository {
        async fn get(&self, id: u64, _preloads: &[String]) -> RepositoryResult<Option<MockEntity>> {
            Ok((id == 1).then_some(MockEntity { id }))
        }

        async fn first(&self, _filters: &[FilterCondition]) -> RepositoryResult<Option<MockEntity>> {
            Ok(None)
        }

        async fn list(&self, _filters: &[FilterCondition]) -> RepositoryResult<Vec<MockEntity>> {
            Ok(vec![MockEntity { id: 1 }])
        }

        async fn page(
            &self,
            _filters: &[FilterCondition],
            query: PageQuery,
        ) -> RepositoryResult<Page<MockEntity>> {
            Ok(Page {
                items: vec![],
                pagination: Pagination::for_query(query, 0),
            })
        }

        async fn create(&self, model: MockEntity) -> RepositoryResult<MockEntity> {
            Ok(model)
        }

        async fn update(&self, id: u64, _model: MockEntity) -> RepositoryResult<MockEntity> {
            Ok(MockEntity { id })
        }

        async fn update_fields(
            &self,
            _id: u64,
            _base: &MockEntity,
            _fields: Map<String, Value>,
        ) -> RepositoryResult<()> {
            Ok(())
        }

        async fn soft_delete(&self, id: u64) -> RepositoryResult<MockEntity> {
            Ok(MockEntity { id })
        }

        async fn restore(&self, id: u64) -> RepositoryResult<MockEntity> {
            Err(RepositoryError::not_found("MockEntity", id)
                .with_operation(RepositoryOperation::Restore))
        }

        async fn hard_delete(&self, _id: u64) -> RepositoryResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mock_repository_get() {
        let repo = MockRepository;
        assert_eq!(repo.get(1, &[]).await.unwrap(), Some(MockEntity { id: 1 }));
        assert!(repo.get(2, &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_repository_restore_error() {
        let repo = MockRepository;
        let error = repo.restore(5).await.unwrap_err();
        assert_eq!(error.operation, RepositoryOperation::Restore);
    }
}
