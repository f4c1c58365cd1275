//! Optional per-service callbacks
//!
//! Hooks run inside the request task, after decoding and before any
//! repository call. They see the request head (method, URI, headers,
//! extensions) so they can read authentication state placed there by
//! middleware. Returning an [`ApiError`] vetoes the operation; the client
//! receives that error's message.

use std::fmt;
use std::sync::Arc;

use axum::http::request::Parts;
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::repository::FilterCondition;

/// Rewrites or extends a client's filter set
pub type FilterHook = Arc<dyn Fn(Vec<FilterCondition>, &Parts) -> Vec<FilterCondition> + Send + Sync>;

/// Runs before create with the decoded instance
pub type BeforeCreateHook<M> = Arc<dyn Fn(M, &Parts) -> Result<M, ApiError> + Send + Sync>;

/// Runs before update with the decoded payload and target id
pub type BeforeUpdateHook<M> =
    Arc<dyn Fn(UpdateInput<M>, u64, &Parts) -> Result<(UpdateInput<M>, u64), ApiError> + Send + Sync>;

/// Runs before soft or hard delete with the pre-fetched row
pub type BeforeDeleteHook<M> = Arc<dyn Fn(&M, &Parts) -> Result<(), ApiError> + Send + Sync>;

/// Payload handed to a before-update hook
///
/// Full updates pass a complete instance; partial updates pass the sparse
/// field set. A hook must return the same variant it received.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateInput<M> {
    /// Full replacement instance
    Model(M),
    /// Sparse field set for a partial update
    Fields(Map<String, Value>),
}

/// The hook set bound to one resource service
///
/// Built once at start-up and never changed afterwards.
///
/// ```rust,ignore
/// let hooks = Hooks::new()
///     .filter(|mut filters, parts| {
///         filters.push(FilterCondition::eq("tenant", tenant_of(parts)));
///         filters
///     })
///     .before_create(|widget: Widget, _| {
///         if widget.name.is_empty() {
///             return Err(ApiError::vetoed("name is required"));
///         }
///         Ok(widget)
///     });
/// ```
pub struct Hooks<M> {
    pub(crate) filter: Option<FilterHook>,
    pub(crate) before_create: Option<BeforeCreateHook<M>>,
    pub(crate) before_update: Option<BeforeUpdateHook<M>>,
    pub(crate) before_delete: Option<BeforeDeleteHook<M>>,
}

impl<M> Default for Hooks<M> {
    fn default() -> Self {
        Self {
            filter: None,
            before_create: None,
            before_update: None,
            before_delete: None,
        }
    }
}

impl<M> Clone for Hooks<M> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            before_create: self.before_create.clone(),
            before_update: self.before_update.clone(),
            before_delete: self.before_delete.clone(),
        }
    }
}

impl<M> fmt::Debug for Hooks<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("filter", &self.filter.is_some())
            .field("before_create", &self.before_create.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("before_delete", &self.before_delete.is_some())
            .finish()
    }
}

impl<M> Hooks<M> {
    /// No hooks
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<FilterCondition>, &Parts) -> Vec<FilterCondition> + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn before_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(M, &Parts) -> Result<M, ApiError> + Send + Sync + 'static,
    {
        self.before_create = Some(Arc::new(hook));
        self
    }

    /// Set the before-update hook, shared by full and partial updates
    ///
    /// The hook may rewrite the target id. The rewritten id is the one
    /// persisted and invalidated.
    #[must_use]
    pub fn before_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(UpdateInput<M>, u64, &Parts) -> Result<(UpdateInput<M>, u64), ApiError>
            + Send
            + Sync
            + 'static,
    {
        self.before_update = Some(Arc::new(hook));
        self
    }

    /// Set the before-delete hook, run for both soft and hard delete
    ///
    /// With this hook set, the row is fetched first and a failed fetch
    /// aborts the delete.
    #[must_use]
    pub fn before_delete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&M, &Parts) -> Result<(), ApiError> + Send + Sync + 'static,
    {
        self.before_delete = Some(Arc::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.before_create.is_none()
            && self.before_update.is_none()
            && self.before_delete.is_none()
    }
}
