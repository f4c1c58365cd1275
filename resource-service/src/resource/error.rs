//! Per-request error type for resource handlers
//!
//! [`ApiError`] short-circuits a handler and renders as the failure envelope
//! `{"ok": false, "error": "<message>"}` with an HTTP status taken from its
//! [`ApiErrorKind`].
//!
//! # Example
//!
//! ```rust
//! use resource_service::resource::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found("Widget", 7);
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.entity_id, Some("7".to_string()));
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::envelope::Envelope;
use crate::action::Action;
use crate::repository::{RepositoryError, RepositoryErrorKind};

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Entity was not found
    NotFound,
    /// Entity already exists
    AlreadyExists,
    /// Request body or path could not be decoded
    BadRequest,
    /// Request validation failed
    ValidationFailed,
    /// A before-create, before-update or before-delete hook refused the operation
    Vetoed,
    /// Authentication required
    Unauthorized,
    /// Access denied
    Forbidden,
    /// Operation conflicts with current state
    Conflict,
    /// Internal server error
    InternalError,
    /// Backend temporarily unavailable
    ServiceUnavailable,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::Vetoed => write!(f, "vetoed"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Conflict => write!(f, "conflict"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::Conflict => StatusCode::CONFLICT,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::ValidationFailed | Self::Vetoed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Structured API error with action context
///
/// Hooks return this type to veto an operation. Its message is what the
/// client sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The action being served when the error occurred
    pub action: Option<Action>,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable error message, sent to the client
    pub message: String,
    /// The model type involved (e.g. "Widget")
    pub entity_type: Option<String>,
    /// The primary key involved
    pub entity_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            action: None,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a "not found" error with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        Self::new(ApiErrorKind::NotFound, "record not found").with_entity(entity_type, entity_id)
    }

    /// Create a bad request error, used for undecodable payloads
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::BadRequest, message)
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::ValidationFailed, message)
    }

    /// Create a hook veto
    ///
    /// ```rust
    /// use resource_service::resource::{ApiError, ApiErrorKind};
    ///
    /// let veto = ApiError::vetoed("widgets are frozen");
    /// assert_eq!(veto.kind.status_code().as_u16(), 422);
    /// ```
    pub fn vetoed(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Vetoed, message)
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Forbidden, message)
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Conflict, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InternalError, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl fmt::Display,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.to_string());
        self
    }

    /// Set the action being served, keeping one that is already set
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action.get_or_insert(action);
        self
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::ServiceUnavailable)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API {} error", self.kind)?;
        if let Some(action) = self.action {
            write!(f, " during {}", action)?;
        }
        write!(f, ": {}", self.message)?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();
        let action = self.action.map(Action::name);

        if status.is_server_error() {
            tracing::error!(
                action,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                retriable = self.is_retriable(),
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(
                action,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        }

        (status, Json(Envelope::failure(self.message))).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    /// The repository message is passed through unchanged.
    fn from(err: RepositoryError) -> Self {
        let kind = match err.kind {
            RepositoryErrorKind::NotFound => ApiErrorKind::NotFound,
            RepositoryErrorKind::AlreadyExists => ApiErrorKind::AlreadyExists,
            RepositoryErrorKind::ConstraintViolation => ApiErrorKind::Conflict,
            RepositoryErrorKind::ValidationFailed => ApiErrorKind::ValidationFailed,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout => {
                ApiErrorKind::ServiceUnavailable
            }
            RepositoryErrorKind::DatabaseError
            | RepositoryErrorKind::SerializationError
            | RepositoryErrorKind::Other => ApiErrorKind::InternalError,
        };

        Self {
            action: None,
            kind,
            message: err.message,
            entity_type: err.entity_type,
            entity_id: err.entity_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiErrorKind::Vetoed.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiErrorKind::AlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiErrorKind::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_repository_message_is_verbatim() {
        let err = RepositoryError::database_error(RepositoryOperation::Update, "deadlock detected");
        let api: ApiError = err.into();
        assert_eq!(api.kind, ApiErrorKind::InternalError);
        assert_eq!(api.message, "deadlock detected");
    }

    #[test]
    fn test_repository_kind_mapping() {
        let timeout = RepositoryError::new(
            RepositoryOperation::List,
            RepositoryErrorKind::Timeout,
            "slow",
        );
        assert!(ApiError::from(timeout).is_retriable());

        let missing = ApiError::from(RepositoryError::not_found("Widget", 3));
        assert_eq!(missing.kind, ApiErrorKind::NotFound);
        assert_eq!(missing.entity_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_with_action_keeps_first() {
        let err = ApiError::vetoed("no")
            .with_action(Action::Create)
            .with_action(Action::Update);
        assert_eq!(err.action, Some(Action::Create));
        assert_eq!(err.to_string(), "API vetoed error during Create: no");
    }

    #[tokio::test]
    async fn test_into_response_is_failure_envelope() {
        let response = ApiError::not_found("Widget", 9).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "record not found"}));
    }
}
