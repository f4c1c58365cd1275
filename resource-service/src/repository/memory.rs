//! In-process Repository Port adapter
//!
//! Rows live in a [`DashMap`] keyed by primary key. Filters are evaluated
//! against each row's JSON form, so any [`Resource`] works without a schema.
//! Relations are not modelled; preload names are accepted and ignored.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use regex::Regex;
use serde_json::{Map, Value};

use super::error::{RepositoryError, RepositoryOperation};
use super::filter::{FilterCondition, FilterOperator};
use super::pagination::{Page, PageQuery};
use super::traits::{RepositoryResult, ResourceRepository};
use crate::resource::{short_type_name, Resource};

#[derive(Debug, Clone)]
struct StoredRow<M> {
    model: M,
    deleted_at: Option<DateTime<Utc>>,
}

/// Number of calls made to each port operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub get: u64,
    pub first: u64,
    pub list: u64,
    pub page: u64,
    pub create: u64,
    pub update: u64,
    pub update_fields: u64,
    pub soft_delete: u64,
    pub restore: u64,
    pub hard_delete: u64,
}

#[derive(Debug, Default)]
struct CallCounters {
    get: AtomicU64,
    first: AtomicU64,
    list: AtomicU64,
    page: AtomicU64,
    create: AtomicU64,
    update: AtomicU64,
    update_fields: AtomicU64,
    soft_delete: AtomicU64,
    restore: AtomicU64,
    hard_delete: AtomicU64,
}

impl CallCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, AtomicOrdering::Relaxed);
    }

    fn snapshot(&self) -> RepositoryStats {
        let load = |c: &AtomicU64| c.load(AtomicOrdering::Relaxed);
        RepositoryStats {
            get: load(&self.get),
            first: load(&self.first),
            list: load(&self.list),
            page: load(&self.page),
            create: load(&self.create),
            update: load(&self.update),
            update_fields: load(&self.update_fields),
            soft_delete: load(&self.soft_delete),
            restore: load(&self.restore),
            hard_delete: load(&self.hard_delete),
        }
    }
}

/// [`ResourceRepository`] backed by process memory
///
/// Ids are assigned from an auto-incrementing counter starting at 1 when a
/// created model carries id 0. Soft-deleted rows keep their slot and are
/// hidden from every read except [`restore`](ResourceRepository::restore).
///
/// # Example
///
/// ```rust,ignore
/// let repo = InMemoryRepository::<Widget>::new();
/// let widget = repo.create(Widget { id: 0, name: "x".into() }).await?;
/// assert_eq!(widget.id, 1);
/// assert_eq!(repo.stats().create, 1);
/// ```
#[derive(Debug)]
pub struct InMemoryRepository<M> {
    entity: &'static str,
    rows: DashMap<u64, StoredRow<M>>,
    next_id: AtomicU64,
    calls: CallCounters,
}

impl<M: Resource> Default for InMemoryRepository<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Resource> InMemoryRepository<M> {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            entity: short_type_name::<M>(),
            rows: DashMap::new(),
            next_id: AtomicU64::new(1),
            calls: CallCounters::default(),
        }
    }

    /// Call counts per operation since construction
    pub fn stats(&self) -> RepositoryStats {
        self.calls.snapshot()
    }

    /// Number of stored rows, soft-deleted ones included
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are stored
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the row with this id exists and is soft-deleted
    pub fn is_soft_deleted(&self, id: u64) -> bool {
        self.rows
            .get(&id)
            .is_some_and(|row| row.deleted_at.is_some())
    }

    fn visible(&self, id: u64) -> Option<M> {
        self.rows
            .get(&id)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.model.clone())
    }

    /// Visible rows matching every filter, in primary key order
    fn matching(
        &self,
        operation: RepositoryOperation,
        filters: &[FilterCondition],
    ) -> RepositoryResult<Vec<M>> {
        let compiled = filters
            .iter()
            .map(|f| CompiledFilter::compile(f, operation))
            .collect::<RepositoryResult<Vec<_>>>()?;

        let mut rows = Vec::new();
        for entry in self.rows.iter() {
            if entry.deleted_at.is_some() {
                continue;
            }
            let json = serde_json::to_value(&entry.model).map_err(|e| {
                RepositoryError::serialization_error(operation, e.to_string())
                    .with_entity(self.entity, entry.key())
            })?;
            if compiled.iter().all(|f| f.matches(&json)) {
                rows.push(entry.model.clone());
            }
        }
        rows.sort_by_key(|model| model.id());
        Ok(rows)
    }
}

impl<M: Resource> ResourceRepository<M> for InMemoryRepository<M> {
    async fn get(&self, id: u64, _preloads: &[String]) -> RepositoryResult<Option<M>> {
        CallCounters::bump(&self.calls.get);
        Ok(self.visible(id))
    }

    async fn first(&self, filters: &[FilterCondition]) -> RepositoryResult<Option<M>> {
        CallCounters::bump(&self.calls.first);
        Ok(self
            .matching(RepositoryOperation::First, filters)?
            .into_iter()
            .next())
    }

    async fn list(&self, filters: &[FilterCondition]) -> RepositoryResult<Vec<M>> {
        CallCounters::bump(&self.calls.list);
        self.matching(RepositoryOperation::List, filters)
    }

    async fn page(&self, filters: &[FilterCondition], query: PageQuery) -> RepositoryResult<Page<M>> {
        CallCounters::bump(&self.calls.page);
        let rows = self.matching(RepositoryOperation::Page, filters)?;
        Ok(Page::from_rows(rows, query))
    }

    async fn create(&self, mut model: M) -> RepositoryResult<M> {
        CallCounters::bump(&self.calls.create);
        let id = match model.id() {
            0 => self.next_id.fetch_add(1, AtomicOrdering::SeqCst),
            id => {
                let next = id.checked_add(1).ok_or_else(|| {
                    RepositoryError::validation_failed(
                        RepositoryOperation::Create,
                        format!("id {} is out of range", id),
                    )
                })?;
                self.next_id.fetch_max(next, AtomicOrdering::SeqCst);
                id
            }
        };
        model.set_id(id);

        match self.rows.entry(id) {
            Entry::Occupied(_) => Err(RepositoryError::already_exists(self.entity, id)),
            Entry::Vacant(slot) => {
                slot.insert(StoredRow {
                    model: model.clone(),
                    deleted_at: None,
                });
                Ok(model)
            }
        }
    }

    async fn update(&self, id: u64, mut model: M) -> RepositoryResult<M> {
        CallCounters::bump(&self.calls.update);
        let mut row = self
            .rows
            .get_mut(&id)
            .filter(|row| row.deleted_at.is_none())
            .ok_or_else(|| {
                RepositoryError::not_found(self.entity, id)
                    .with_operation(RepositoryOperation::Update)
            })?;
        model.set_id(id);
        row.model = model.clone();
        Ok(model)
    }

    async fn update_fields(
        &self,
        id: u64,
        _base: &M,
        fields: Map<String, Value>,
    ) -> RepositoryResult<()> {
        CallCounters::bump(&self.calls.update_fields);
        let op = RepositoryOperation::UpdateFields;
        let mut row = self
            .rows
            .get_mut(&id)
            .filter(|row| row.deleted_at.is_none())
            .ok_or_else(|| RepositoryError::not_found(self.entity, id).with_operation(op))?;

        let mut json = serde_json::to_value(&row.model)
            .map_err(|e| RepositoryError::serialization_error(op, e.to_string()))?;
        if let Value::Object(existing) = &mut json {
            existing.extend(fields);
        }
        let mut merged: M = serde_json::from_value(json).map_err(|e| {
            RepositoryError::serialization_error(op, e.to_string()).with_entity(self.entity, id)
        })?;
        merged.set_id(id);
        row.model = merged;
        Ok(())
    }

    async fn soft_delete(&self, id: u64) -> RepositoryResult<M> {
        CallCounters::bump(&self.calls.soft_delete);
        let mut row = self
            .rows
            .get_mut(&id)
            .filter(|row| row.deleted_at.is_none())
            .ok_or_else(|| {
                RepositoryError::not_found(self.entity, id)
                    .with_operation(RepositoryOperation::SoftDelete)
            })?;
        row.deleted_at = Some(Utc::now());
        Ok(row.model.clone())
    }

    async fn restore(&self, id: u64) -> RepositoryResult<M> {
        CallCounters::bump(&self.calls.restore);
        let mut row = self.rows.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found(self.entity, id).with_operation(RepositoryOperation::Restore)
        })?;
        row.deleted_at = None;
        Ok(row.model.clone())
    }

    async fn hard_delete(&self, id: u64) -> RepositoryResult<()> {
        CallCounters::bump(&self.calls.hard_delete);
        self.rows.remove(&id).map(|_| ()).ok_or_else(|| {
            RepositoryError::not_found(self.entity, id)
                .with_operation(RepositoryOperation::HardDelete)
        })
    }
}

/// A filter term with its LIKE pattern compiled once per query
struct CompiledFilter<'a> {
    condition: &'a FilterCondition,
    value: Value,
    pattern: Option<Regex>,
}

impl<'a> CompiledFilter<'a> {
    fn compile(
        condition: &'a FilterCondition,
        operation: RepositoryOperation,
    ) -> RepositoryResult<Self> {
        let value = condition.value.to_json();
        let pattern = match condition.operator {
            FilterOperator::Like => {
                let Value::String(raw) = &value else {
                    return Err(RepositoryError::validation_failed(
                        operation,
                        format!("LIKE on '{}' needs a string pattern", condition.field),
                    ));
                };
                let regex = Regex::new(&like_to_regex(raw)).map_err(|e| {
                    RepositoryError::validation_failed(operation, e.to_string())
                })?;
                Some(regex)
            }
            _ => None,
        };
        Ok(Self {
            condition,
            value,
            pattern,
        })
    }

    fn matches(&self, row: &Value) -> bool {
        let field = row.get(&self.condition.field).unwrap_or(&Value::Null);
        match self.condition.operator {
            FilterOperator::Equal => json_eq(field, &self.value),
            FilterOperator::NotEqual => !json_eq(field, &self.value),
            FilterOperator::GreaterThan => json_cmp(field, &self.value) == Some(Ordering::Greater),
            FilterOperator::GreaterThanOrEqual => matches!(
                json_cmp(field, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LessThan => json_cmp(field, &self.value) == Some(Ordering::Less),
            FilterOperator::LessThanOrEqual => matches!(
                json_cmp(field, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => match (field, &self.pattern) {
                (Value::String(s), Some(regex)) => regex.is_match(s),
                _ => false,
            },
            FilterOperator::In => self.in_list(field),
            FilterOperator::NotIn => !self.in_list(field),
            FilterOperator::IsNull => field.is_null(),
            FilterOperator::IsNotNull => !field.is_null(),
        }
    }

    fn in_list(&self, field: &Value) -> bool {
        match &self.value {
            Value::Array(items) => items.iter().any(|item| json_eq(field, item)),
            single => json_eq(field, single),
        }
    }
}

/// Translate a SQL LIKE pattern into an anchored regex
fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => json_cmp(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn json_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{FilterValue, RepositoryErrorKind};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Gadget {
        id: u64,
        name: String,
        weight: i64,
        colour: Option<String>,
    }

    impl Resource for Gadget {
        fn id(&self) -> u64 {
            self.id
        }

        fn set_id(&mut self, id: u64) {
            self.id = id;
        }
    }

    fn gadget(name: &str, weight: i64) -> Gadget {
        Gadget {
            name: name.to_string(),
            weight,
            ..Gadget::default()
        }
    }

    async fn seeded() -> InMemoryRepository<Gadget> {
        let repo = InMemoryRepository::new();
        repo.create(gadget("alpha", 10)).await.unwrap();
        repo.create(gadget("beta", 20)).await.unwrap();
        repo.create(Gadget {
            colour: Some("red".to_string()),
            ..gadget("alphabet", 30)
        })
        .await
        .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = seeded().await;
        let ids: Vec<u64> = repo.list(&[]).await.unwrap().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(repo.stats().create, 3);
    }

    #[tokio::test]
    async fn test_create_with_taken_id_fails() {
        let repo = seeded().await;
        let error = repo
            .create(Gadget {
                id: 2,
                ..gadget("dup", 1)
            })
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_with_max_id_is_rejected() {
        let repo = seeded().await;
        let error = repo
            .create(Gadget {
                id: u64::MAX,
                ..gadget("edge", 1)
            })
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ValidationFailed);
        assert_eq!(repo.len(), 3);

        let next = repo.create(gadget("after", 1)).await.unwrap();
        assert_eq!(next.id, 4);
    }

    #[tokio::test]
    async fn test_filters_are_a_conjunction() {
        let repo = seeded().await;
        let rows = repo
            .list(&[
                FilterCondition::like("name", "alpha%"),
                FilterCondition::gt("weight", 15),
            ])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "alphabet");
    }

    #[tokio::test]
    async fn test_in_with_mixed_numeric_list() {
        let repo = seeded().await;
        let values = FilterValue::List(vec![FilterValue::Float(10.0), FilterValue::Float(30.0)]);
        let rows = repo
            .list(&[FilterCondition::is_in("weight", values)])
            .await
            .unwrap();
        assert_eq!(
            rows.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(),
            vec!["alpha", "alphabet"]
        );
    }

    #[tokio::test]
    async fn test_like_underscore_and_escaping() {
        let repo = seeded().await;
        let rows = repo
            .list(&[FilterCondition::like("name", "bet_")])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let none = repo
            .list(&[FilterCondition::like("name", "alph.")])
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_in_and_null_operators() {
        let repo = seeded().await;
        let rows = repo
            .list(&[FilterCondition::is_in("weight", vec![10_i64, 30])])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        let uncoloured = repo
            .list(&[FilterCondition::is_null("colour")])
            .await
            .unwrap();
        assert_eq!(uncoloured.len(), 2);
    }

    #[tokio::test]
    async fn test_first_returns_lowest_id_match() {
        let repo = seeded().await;
        let first = repo
            .first(&[FilterCondition::like("name", "%a%")])
            .await
            .unwrap();
        assert_eq!(first.map(|g| g.id), Some(1));
        assert!(repo
            .first(&[FilterCondition::eq("name", "none")])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty() {
        let repo = seeded().await;
        let page = repo.page(&[], PageQuery::new(5, 2)).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.page_count, 2);
    }

    #[tokio::test]
    async fn test_update_fields_merges_only_supplied_fields() {
        let repo = seeded().await;
        let base = repo.get(2, &[]).await.unwrap().unwrap();
        let fields = json!({"weight": 3}).as_object().cloned().unwrap();
        repo.update_fields(2, &base, fields).await.unwrap();

        let row = repo.get(2, &[]).await.unwrap().unwrap();
        assert_eq!(row.name, "beta");
        assert_eq!(row.weight, 3);
    }

    #[tokio::test]
    async fn test_soft_delete_then_restore() {
        let repo = seeded().await;
        repo.soft_delete(1).await.unwrap();
        assert!(repo.get(1, &[]).await.unwrap().is_none());
        assert!(repo.is_soft_deleted(1));
        assert_eq!(repo.list(&[]).await.unwrap().len(), 2);

        repo.restore(1).await.unwrap();
        assert!(repo.get(1, &[]).await.unwrap().is_some());
        assert_eq!(repo.list(&[]).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_hard_delete_removes_row() {
        let repo = seeded().await;
        repo.hard_delete(3).await.unwrap();
        assert_eq!(repo.len(), 2);
        let error = repo.hard_delete(3).await.unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.operation, RepositoryOperation::HardDelete);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let repo = seeded().await;
        let error = repo.update(99, gadget("x", 1)).await.unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.operation, RepositoryOperation::Update);
    }

    #[test]
    fn test_like_to_regex() {
        assert_eq!(like_to_regex("a%b_"), "^a.*b.$");
        assert_eq!(like_to_regex("1.5"), "^1\\.5$");
    }
}
