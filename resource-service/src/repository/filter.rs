//! Filter terms for repository queries
//!
//! A filter set is an ordered `Vec<FilterCondition>` read as a conjunction.
//! Clients send them as `{"field": .., "operator": .., "value": ..}` objects.
//! A server-side filter hook may rewrite or extend the set before it reaches
//! the repository.
//!
//! # Example
//!
//! ```rust
//! use resource_service::repository::{FilterCondition, FilterOperator};
//!
//! let filters: Vec<FilterCondition> = serde_json::from_str(
//!     r#"[{"field":"name","operator":"like","value":"wid%"},
//!         {"field":"deleted_at","operator":"is null"}]"#,
//! ).unwrap();
//!
//! assert_eq!(filters[0].operator, FilterOperator::Like);
//! assert_eq!(filters[1], FilterCondition::is_null("deleted_at"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equal to (=)
    #[serde(rename = "=", alias = "eq")]
    Equal,
    /// Not equal to (!=)
    #[serde(rename = "!=", alias = "ne", alias = "<>")]
    NotEqual,
    /// Greater than (>)
    #[serde(rename = ">", alias = "gt")]
    GreaterThan,
    /// Greater than or equal to (>=)
    #[serde(rename = ">=", alias = "gte")]
    GreaterThanOrEqual,
    /// Less than (<)
    #[serde(rename = "<", alias = "lt")]
    LessThan,
    /// Less than or equal to (<=)
    #[serde(rename = "<=", alias = "lte")]
    LessThanOrEqual,
    /// Pattern matching with `%` and `_` wildcards
    #[serde(rename = "like", alias = "LIKE")]
    Like,
    /// Value is in a list
    #[serde(rename = "in", alias = "IN")]
    In,
    /// Value is not in a list
    #[serde(rename = "not in", alias = "NOT IN")]
    NotIn,
    /// Value is null
    #[serde(rename = "is null", alias = "IS NULL")]
    IsNull,
    /// Value is not null
    #[serde(rename = "is not null", alias = "IS NOT NULL")]
    IsNotNull,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::In => write!(f, "IN"),
            Self::NotIn => write!(f, "NOT IN"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// A value that can be used in filter conditions
///
/// Decoded untagged from JSON: `null`, booleans, integers, floats, strings
/// and lists. Integers above `i64::MAX` stay exact as [`Unsigned`](Self::Unsigned).
/// Lists that are not all integers or all strings decode as [`List`](Self::List).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value (for IS NULL / IS NOT NULL)
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit integer value
    Integer(i64),
    /// Unsigned integer too large for `i64`
    Unsigned(u64),
    /// 64-bit floating point value
    Float(f64),
    /// String value
    String(String),
    /// List of integer values (for IN / NOT IN)
    IntegerList(Vec<i64>),
    /// List of string values (for IN / NOT IN)
    StringList(Vec<String>),
    /// Any other list: floats, booleans or mixed values
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// The value as a JSON value, for backends that evaluate filters over JSON rows
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::from(*b),
            Self::Integer(n) => Value::from(*n),
            Self::Unsigned(n) => Value::from(*n),
            Self::Float(n) => Value::from(*n),
            Self::String(s) => Value::from(s.as_str()),
            Self::IntegerList(list) => Value::from(list.clone()),
            Self::StringList(list) => Value::from(list.clone()),
            Self::List(list) => Value::Array(list.iter().map(Self::to_json).collect()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u64> for FilterValue {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Self::Unsigned(n), Self::Integer)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

/// A single predicate term: `field operator value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    #[serde(default)]
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter (field = value)
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// Create a not-equal filter (field != value)
    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value.into())
    }

    /// Create a greater-than filter (field > value)
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    /// Create a greater-than-or-equal filter (field >= value)
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    /// Create a less-than filter (field < value)
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    /// Create a less-than-or-equal filter (field <= value)
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }

    /// Create a LIKE pattern filter
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, FilterValue::String(pattern.into()))
    }

    /// Create an IN list filter
    pub fn is_in(field: impl Into<String>, values: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::In, values.into())
    }

    /// Create an IS NULL filter
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNull, FilterValue::Null)
    }

    /// Create an IS NOT NULL filter
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNotNull, FilterValue::Null)
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            FilterOperator::IsNull | FilterOperator::IsNotNull => {
                write!(f, "{} {}", self.field, self.operator)
            }
            _ => write!(f, "{} {} {}", self.field, self.operator, self.value.to_json()),
        }
    }
}
