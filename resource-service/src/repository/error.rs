//! Repository error types
//!
//! Structured errors reported by a persistence backend through the
//! [`ResourceRepository`](super::ResourceRepository) port.
//!
//! # Example
//!
//! ```rust
//! use resource_service::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("Widget", 7);
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert_eq!(error.entity_id.as_deref(), Some("7"));
//! ```

use std::fmt;

/// Port operation in flight when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Fetching one row by primary key
    Get,
    /// Fetching the first row matching a filter set
    First,
    /// Fetching every row matching a filter set
    List,
    /// Fetching one page of rows
    Page,
    /// Inserting a new row
    Create,
    /// Replacing a row
    Update,
    /// Merging a sparse field set into a row
    UpdateFields,
    /// Marking a row as deleted
    SoftDelete,
    /// Clearing a soft-delete mark
    Restore,
    /// Removing a row permanently
    HardDelete,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::First => write!(f, "first"),
            Self::List => write!(f, "list"),
            Self::Page => write!(f, "page"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::UpdateFields => write!(f, "update_fields"),
            Self::SoftDelete => write!(f, "soft_delete"),
            Self::Restore => write!(f, "restore"),
            Self::HardDelete => write!(f, "hard_delete"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// No row for the given id or filter set
    NotFound,
    /// Row already exists (duplicate key)
    AlreadyExists,
    /// Database constraint violation
    ConstraintViolation,
    /// Validation failed before the write
    ValidationFailed,
    /// Failed to reach the backend
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// Underlying database error
    DatabaseError,
    /// Row could not be converted to or from the model type
    SerializationError,
    /// Other unclassified error
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error with operation context
///
/// The resource layer never retries on these. [`is_retriable`](Self::is_retriable)
/// exists for port implementations that want their own retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The model type involved (e.g. "Widget")
    pub entity_type: Option<String>,
    /// The primary key involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a "not found" error for a primary key lookup
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_service::repository::{RepositoryError, RepositoryOperation};
    ///
    /// let error = RepositoryError::not_found("Widget", 3)
    ///     .with_operation(RepositoryOperation::Restore);
    /// assert_eq!(error.entity_type.as_deref(), Some("Widget"));
    /// ```
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        Self {
            operation: RepositoryOperation::Get,
            kind: RepositoryErrorKind::NotFound,
            message: "record not found".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.to_string()),
        }
    }

    /// Create a "not found" error for a filtered lookup with no match
    pub fn no_match(operation: RepositoryOperation, entity_type: impl Into<String>) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::NotFound,
            message: "record not found".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: None,
        }
    }

    /// Create an "already exists" error
    pub fn already_exists(entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        Self {
            operation: RepositoryOperation::Create,
            kind: RepositoryErrorKind::AlreadyExists,
            message: "record already exists".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.to_string()),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::ValidationFailed, message)
    }

    /// Create a database error
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
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

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is transient
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{}: {}]", entity_type, entity_id),
            (Some(entity_type), None) => write!(f, " [{}]", entity_type),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for RepositoryError {}
