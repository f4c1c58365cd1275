//! The generic per-model CRUD dispatcher
//!
//! A [`ResourceService`] binds one [`Resource`] type to a repository, an
//! optional cache and an optional hook set. Its methods are the operations
//! behind each [`Action`]; the axum handlers in this module's sibling only
//! decode requests and shape envelopes around them.
//!
//! Cache discipline:
//! - Only fetch-by-id reads through the cache, and only for cacheable models.
//! - Every successful update, partial update, soft delete, restore or hard
//!   delete invalidates the row's bare key and all its preload variants,
//!   strictly after the repository call returns.
//! - Cache failures are logged and otherwise ignored.

use std::sync::Arc;

use axum::http::request::Parts;
use serde_json::{Map, Value};

use super::descriptor::{ModelDescriptor, Resource};
use super::error::{ApiError, ApiErrorKind};
use super::hooks::{Hooks, UpdateInput};
use super::requests::{IdRequest, PageRequest};
use crate::action::Action;
use crate::cache::{get_typed, set_typed, CacheKey, CachePort};
use crate::config::ResourceSettings;
use crate::repository::{FilterCondition, Page, ResourceRepository};

/// CRUD operations for model `M` over repository `R`
///
/// # Example
///
/// ```rust,ignore
/// let service = ResourceService::new(
///     ModelDescriptor::<Widget>::new("widget", "widgets"),
///     Arc::new(InMemoryRepository::new()),
/// )
/// .with_cache(Arc::new(InMemoryCache::new()))
/// .with_hooks(Hooks::new().before_create(|w, _| Ok(w)));
///
/// let app = Arc::new(service).router("/widget", ActionSet::All.actions().iter().copied())?;
/// ```
pub struct ResourceService<M, R> {
    descriptor: ModelDescriptor<M>,
    repository: Arc<R>,
    cache: Option<Arc<dyn CachePort>>,
    hooks: Hooks<M>,
    settings: ResourceSettings,
}

impl<M, R> ResourceService<M, R>
where
    M: Resource,
    R: ResourceRepository<M>,
{
    /// Create a service with no cache, no hooks and default settings
    pub fn new(descriptor: ModelDescriptor<M>, repository: Arc<R>) -> Self {
        Self {
            descriptor,
            repository,
            cache: None,
            hooks: Hooks::default(),
            settings: ResourceSettings::default(),
        }
    }

    /// Attach the shared cache
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CachePort>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Hooks<M>) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ResourceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn descriptor(&self) -> &ModelDescriptor<M> {
        &self.descriptor
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn settings(&self) -> &ResourceSettings {
        &self.settings
    }

    /// Whether this service can serve `action`
    pub fn supports(&self, action: Action) -> bool {
        self.descriptor.supports(action)
    }

    /// Fetch one row, reading through the cache when the model allows it
    pub async fn get_by_id(&self, request: IdRequest) -> Result<M, ApiError> {
        let action = Action::GetById;
        let key = CacheKey::new(self.descriptor.type_name(), request.id)
            .with_preloads(&request.preloads)
            .to_string();

        if let Some(cache) = self.active_cache() {
            match get_typed::<M>(cache.as_ref(), &key).await {
                Ok(Some(model)) => {
                    tracing::debug!(model = self.descriptor.type_name(), key = %key, "cache hit");
                    return Ok(model);
                }
                Ok(None) => {
                    tracing::debug!(model = self.descriptor.type_name(), key = %key, "cache miss");
                }
                // Cache errors degrade to a miss
                Err(e) => {
                    tracing::warn!(model = self.descriptor.type_name(), key = %key, error = %e, "cache read failed");
                }
            }
        }

        let model = self.fetch(request.id, &request.preloads, action).await?;

        if let Some(cache) = self.active_cache() {
            // Population is best-effort; the read already succeeded
            if let Err(e) = set_typed(cache.as_ref(), &key, &model, self.settings.cache_ttl).await {
                tracing::warn!(model = self.descriptor.type_name(), key = %key, error = %e, "cache write failed");
            }
        }

        Ok(model)
    }

    /// First row matching the (hook-adjusted) filter set
    pub async fn first(&self, filters: Vec<FilterCondition>, parts: &Parts) -> Result<M, ApiError> {
        let action = Action::First;
        let filters = self.apply_filter_hook(filters, parts);
        self.repository
            .first(&filters)
            .await
            .map_err(|e| ApiError::from(e).with_action(action))?
            .ok_or_else(|| ApiError::new(ApiErrorKind::NotFound, "record not found").with_action(action))
    }

    /// Every row matching the (hook-adjusted) filter set
    pub async fn list(&self, filters: Vec<FilterCondition>, parts: &Parts) -> Result<Vec<M>, ApiError> {
        let filters = self.apply_filter_hook(filters, parts);
        self.repository
            .list(&filters)
            .await
            .map_err(|e| ApiError::from(e).with_action(Action::List))
    }

    /// One page of rows matching the (hook-adjusted) filter set
    pub async fn page(&self, request: PageRequest, parts: &Parts) -> Result<Page<M>, ApiError> {
        let query = self.settings.page_query(request.page, request.page_size);
        let filters = self.apply_filter_hook(request.filters, parts);
        self.repository
            .page(&filters, query)
            .await
            .map_err(|e| ApiError::from(e).with_action(Action::Page))
    }

    /// Persist a new row after the before-create hook accepts it
    pub async fn store(&self, model: M, parts: &Parts) -> Result<M, ApiError> {
        let action = Action::Create;
        let model = match &self.hooks.before_create {
            Some(hook) => hook(model, parts).map_err(|e| e.with_action(action))?,
            None => model,
        };
        self.repository
            .create(model)
            .await
            .map_err(|e| ApiError::from(e).with_action(action))
    }

    /// Replace the row at `id` with `model`
    ///
    /// The path id overwrites the model's primary key before the
    /// before-update hook runs. The hook may redirect to another id.
    pub async fn update(&self, id: u64, mut model: M, parts: &Parts) -> Result<M, ApiError> {
        let action = Action::Update;
        model.set_id(id);

        let (mut model, id) = match &self.hooks.before_update {
            Some(hook) => match hook(UpdateInput::Model(model), id, parts) {
                Ok((UpdateInput::Model(model), id)) => (model, id),
                Ok((UpdateInput::Fields(_), _)) => {
                    return Err(ApiError::internal(
                        "before-update hook returned a field set for a full update",
                    )
                    .with_action(action))
                }
                Err(e) => return Err(e.with_action(action)),
            },
            None => (model, id),
        };
        model.set_id(id);

        let updated = self
            .repository
            .update(id, model)
            .await
            .map_err(|e| ApiError::from(e).with_action(action))?;
        self.invalidate(id, action).await;
        Ok(updated)
    }

    /// Merge `fields` into the row at `id`
    ///
    /// Returns the row as read before the merge, not the merged result.
    pub async fn update_fields(
        &self,
        id: u64,
        fields: Map<String, Value>,
        parts: &Parts,
    ) -> Result<M, ApiError> {
        let action = Action::UpdateFields;
        // Always read fresh; merging into a cached copy could resurrect stale fields
        let base = self.fetch(id, &[], action).await?;

        let (fields, id) = match &self.hooks.before_update {
            Some(hook) => match hook(UpdateInput::Fields(fields), id, parts) {
                Ok((UpdateInput::Fields(fields), id)) => (fields, id),
                Ok((UpdateInput::Model(_), _)) => {
                    return Err(ApiError::internal(
                        "before-update hook returned a model for a partial update",
                    )
                    .with_action(action))
                }
                Err(e) => return Err(e.with_action(action)),
            },
            None => (fields, id),
        };

        self.repository
            .update_fields(id, &base, fields)
            .await
            .map_err(|e| ApiError::from(e).with_action(action))?;
        self.invalidate(id, action).await;
        Ok(base)
    }

    /// Soft delete the row at `id`
    pub async fn remove(&self, id: u64, parts: &Parts) -> Result<M, ApiError> {
        let action = Action::Remove;
        self.ensure_supported(action)?;
        self.run_before_delete(id, parts, action).await?;

        let removed = self
            .repository
            .soft_delete(id)
            .await
            .map_err(|e| ApiError::from(e).with_action(action))?;
        self.invalidate(id, action).await;
        Ok(removed)
    }

    /// Undo a soft delete of the row at `id`
    pub async fn restore(&self, id: u64) -> Result<M, ApiError> {
        let action = Action::Restore;
        self.ensure_supported(action)?;

        let restored = self
            .repository
            .restore(id)
            .await
            .map_err(|e| ApiError::from(e).with_action(action))?;
        self.invalidate(id, action).await;
        Ok(restored)
    }

    /// Permanently delete the row at `id`
    pub async fn destroy(&self, id: u64, parts: &Parts) -> Result<(), ApiError> {
        let action = Action::Destroy;
        self.run_before_delete(id, parts, action).await?;

        self.repository
            .hard_delete(id)
            .await
            .map_err(|e| ApiError::from(e).with_action(action))?;
        self.invalidate(id, action).await;
        Ok(())
    }

    fn active_cache(&self) -> Option<&Arc<dyn CachePort>> {
        self.cache
            .as_ref()
            .filter(|_| self.descriptor.is_cacheable())
    }

    fn apply_filter_hook(&self, filters: Vec<FilterCondition>, parts: &Parts) -> Vec<FilterCondition> {
        match &self.hooks.filter {
            Some(hook) => hook(filters, parts),
            None => filters,
        }
    }

    fn ensure_supported(&self, action: Action) -> Result<(), ApiError> {
        if self.supports(action) {
            Ok(())
        } else {
            Err(ApiError::bad_request(format!(
                "{} does not support {}",
                self.descriptor.type_name(),
                action
            ))
            .with_action(action))
        }
    }

    async fn fetch(&self, id: u64, preloads: &[String], action: Action) -> Result<M, ApiError> {
        self.repository
            .get(id, preloads)
            .await
            .map_err(|e| ApiError::from(e).with_action(action))?
            .ok_or_else(|| ApiError::not_found(self.descriptor.type_name(), id).with_action(action))
    }

    /// Pre-fetch and offer the row to the before-delete hook, if one is set
    async fn run_before_delete(&self, id: u64, parts: &Parts, action: Action) -> Result<(), ApiError> {
        let Some(hook) = &self.hooks.before_delete else {
            return Ok(());
        };
        let row = self.fetch(id, &[], action).await?;
        hook(&row, parts).map_err(|e| e.with_action(action))
    }

    /// Drop every cached variant of the row at `id`
    ///
    /// Must only run after the mutation has been persisted.
    async fn invalidate(&self, id: u64, action: Action) {
        if !action.invalidates_cache() {
            return;
        }
        let Some(cache) = self.active_cache() else {
            return;
        };
        for pattern in CacheKey::new(self.descriptor.type_name(), id).invalidation_patterns() {
            // A failed invalidation only costs freshness until the TTL runs out
            if let Err(e) = cache.delete_pattern(&pattern).await {
                tracing::warn!(
                    model = self.descriptor.type_name(),
                    id,
                    action = action.name(),
                    pattern = %pattern,
                    error = %e,
                    "cache invalidation failed"
                );
            }
        }
    }
}
