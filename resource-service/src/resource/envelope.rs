//! Uniform JSON response envelope
//!
//! Success: `{"ok": true, "data": {"<key>": <payload>, "pagination": {...}}}`.
//! Failure: `{"ok": false, "error": "<message>"}`.
//!
//! ```rust
//! use resource_service::resource::Envelope;
//!
//! let envelope = Envelope::ok().with_data("widget", &serde_json::json!({"id": 1})).unwrap();
//! assert_eq!(
//!     serde_json::to_value(&envelope).unwrap(),
//!     serde_json::json!({"ok": true, "data": {"widget": {"id": 1}}}),
//! );
//! ```

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    /// Omitted when nothing was added, as for a hard delete
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// An empty success envelope
    pub fn ok() -> Self {
        Self {
            ok: true,
            data: Map::new(),
            error: None,
        }
    }

    /// A failure envelope carrying `message`
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: Map::new(),
            error: Some(message.into()),
        }
    }

    /// Add a payload under `key`
    pub fn with_data<T: Serialize + ?Sized>(
        mut self,
        key: impl Into<String>,
        payload: &T,
    ) -> Result<Self, ApiError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| ApiError::internal(format!("failed to encode response: {}", e)))?;
        self.data.insert(key.into(), value);
        Ok(self)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
