//! Model binding: the [`Resource`] trait and its [`ModelDescriptor`]

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::action::Action;

/// A data-model type a resource service can serve
///
/// Rows are addressed by a non-negative integer primary key. `Default` is
/// the zero value request bodies are decoded over, so fields a client omits
/// keep their default.
///
/// ```rust
/// use resource_service::resource::Resource;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Widget {
///     id: u64,
///     name: String,
/// }
///
/// impl Resource for Widget {
///     fn id(&self) -> u64 {
///         self.id
///     }
///
///     fn set_id(&mut self, id: u64) {
///         self.id = id;
///     }
/// }
/// ```
pub trait Resource: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {
    /// Primary key value
    fn id(&self) -> u64;

    /// Overwrite the primary key
    fn set_id(&mut self, id: u64);
}

/// Last path segment of a type's name, without generic arguments
///
/// `my_app::models::Widget` becomes `Widget`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Per-service metadata for one model type, fixed at construction
///
/// Holds the model's type name (used in cache keys and error context), the
/// singular and plural envelope keys, the capability flags, and the
/// serialized zero value used as a decoding template.
#[derive(Debug, Clone)]
pub struct ModelDescriptor<M> {
    type_name: String,
    singular: String,
    plural: String,
    cacheable: bool,
    soft_deletable: bool,
    template: Map<String, Value>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Resource> ModelDescriptor<M> {
    /// Describe `M` with its envelope keys
    ///
    /// The model is cacheable and soft-deletable until told otherwise.
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        let template = match serde_json::to_value(M::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self {
            type_name: short_type_name::<M>().to_string(),
            singular: singular.into(),
            plural: plural.into(),
            cacheable: true,
            soft_deletable: true,
            template,
            _model: PhantomData,
        }
    }

    /// Override the type name used in cache keys
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Opt in or out of the cache-aside read path
    #[must_use]
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Declare whether rows support soft delete and restore
    #[must_use]
    pub fn soft_deletable(mut self, soft_deletable: bool) -> Self {
        self.soft_deletable = soft_deletable;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Envelope key for one instance
    pub fn singular(&self) -> &str {
        &self.singular
    }

    /// Envelope key for a list of instances
    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    pub fn is_soft_deletable(&self) -> bool {
        self.soft_deletable
    }

    /// Whether a service for this model can serve `action`
    pub fn supports(&self, action: Action) -> bool {
        self.soft_deletable || !action.requires_soft_delete()
    }

    /// Decode a request body into a fresh instance
    ///
    /// The body must be a JSON object. It is laid over the zero value, so
    /// omitted fields keep their defaults. An empty body yields the zero
    /// value itself.
    pub fn decode(&self, body: &[u8]) -> Result<M, ApiError> {
        let mut merged = self.template.clone();
        merged.extend(decode_object(body)?);
        serde_json::from_value(Value::Object(merged)).map_err(|e| ApiError::bad_request(e.to_string()))
    }

    /// Decode a request body as a sparse field set
    pub fn decode_fields(&self, body: &[u8]) -> Result<Map<String, Value>, ApiError> {
        decode_object(body)
    }
}

fn decode_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::bad_request(format!(
            "expected a JSON object, found {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(ApiError::bad_request(e.to_string())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ApiErrorKind;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: u64,
        name: String,
        stock: i64,
    }

    impl Resource for Widget {
        fn id(&self) -> u64 {
            self.id
        }

        fn set_id(&mut self, id: u64) {
            self.id = id;
        }
    }

    fn descriptor() -> ModelDescriptor<Widget> {
        ModelDescriptor::new("widget", "widgets")
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Widget>(), "Widget");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(descriptor().type_name(), "Widget");
    }

    #[test]
    fn test_decode_fills_omitted_fields_with_zero_values() {
        let widget = descriptor().decode(br#"{"name":"x"}"#).unwrap();
        assert_eq!(
            widget,
            Widget {
                id: 0,
                name: "x".to_string(),
                stock: 0
            }
        );
    }

    #[test]
    fn test_decode_empty_body_is_zero_value() {
        assert_eq!(descriptor().decode(b"  ").unwrap(), Widget::default());
    }

    #[test]
    fn test_decode_type_mismatch_is_bad_request() {
        let err = descriptor().decode(br#"{"stock":"many"}"#).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::BadRequest);

        let err = descriptor().decode(b"[1,2]").unwrap_err();
        assert_eq!(err.message, "expected a JSON object, found an array");
    }

    #[test]
    fn test_decode_fields_keeps_only_supplied_keys() {
        let fields = descriptor().decode_fields(br#"{"stock":3}"#).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["stock"], 3);
    }

    #[test]
    fn test_soft_delete_capability_gates_actions() {
        let hard_only = descriptor().soft_deletable(false);
        assert!(!hard_only.supports(Action::Remove));
        assert!(!hard_only.supports(Action::Restore));
        assert!(hard_only.supports(Action::Destroy));
        assert!(descriptor().supports(Action::Remove));
    }
}
