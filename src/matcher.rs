//! Structured metadata predicates used to filter reads.

use crate::interfaces::{EventStoreError, Result};

/// Comparison operator of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanEquals,
    LowerThan,
    LowerThanEquals,
    In,
    NotIn,
    Regex,
}

impl Operator {
    /// SQL comparison token. `Regex` is vendor specific and has none.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEquals => ">=",
            Operator::LowerThan => "<",
            Operator::LowerThanEquals => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Regex => "",
        }
    }

    fn takes_list(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

/// Where the matched field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A key inside the JSON metadata column.
    Metadata,
    /// A native column of the event row (id, name, creation time, position).
    MessageProperty,
}

/// Value side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<MatchValue>),
}

impl MatchValue {
    pub(crate) fn is_numeric(&self) -> bool {
        matches!(self, MatchValue::Int(_) | MatchValue::Float(_))
    }
}

impl From<&str> for MatchValue {
    fn from(v: &str) -> Self {
        MatchValue::String(v.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(v: String) -> Self {
        MatchValue::String(v)
    }
}

impl From<i64> for MatchValue {
    fn from(v: i64) -> Self {
        MatchValue::Int(v)
    }
}

impl From<i32> for MatchValue {
    fn from(v: i32) -> Self {
        MatchValue::Int(v.into())
    }
}

impl From<u32> for MatchValue {
    fn from(v: u32) -> Self {
        MatchValue::Int(v.into())
    }
}

impl From<f64> for MatchValue {
    fn from(v: f64) -> Self {
        MatchValue::Float(v)
    }
}

impl From<bool> for MatchValue {
    fn from(v: bool) -> Self {
        MatchValue::Bool(v)
    }
}

impl<T: Into<MatchValue>> From<Vec<T>> for MatchValue {
    fn from(values: Vec<T>) -> Self {
        MatchValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// A single `field operator value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataPredicate {
    pub field: String,
    pub operator: Operator,
    pub value: MatchValue,
    pub field_type: FieldType,
}

/// Ordered, AND-combined list of predicates. Empty means no filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMatcher {
    predicates: Vec<MetadataPredicate>,
}

impl MetadataMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate, validating that the value shape fits the operator.
    pub fn with_metadata_match(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<MatchValue>,
        field_type: FieldType,
    ) -> Result<Self> {
        let field = field.into();
        let value = value.into();

        if field.is_empty() {
            return Err(EventStoreError::InvalidArgument(
                "matcher field must not be empty".to_string(),
            ));
        }

        match (&value, operator.takes_list()) {
            (MatchValue::List(items), true) => {
                if items.is_empty() {
                    return Err(EventStoreError::InvalidArgument(format!(
                        "value list for {:?} on '{}' must not be empty",
                        operator, field
                    )));
                }
                if items.iter().any(|item| matches!(item, MatchValue::List(_))) {
                    return Err(EventStoreError::InvalidArgument(format!(
                        "nested lists are not allowed for '{}'",
                        field
                    )));
                }
            }
            (_, true) => {
                return Err(EventStoreError::InvalidArgument(format!(
                    "value for {:?} on '{}' must be a list",
                    operator, field
                )));
            }
            (MatchValue::List(_), false) => {
                return Err(EventStoreError::InvalidArgument(format!(
                    "value for {:?} on '{}' must not be a list",
                    operator, field
                )));
            }
            _ => {}
        }

        if operator == Operator::Regex && !matches!(value, MatchValue::String(_)) {
            return Err(EventStoreError::InvalidArgument(format!(
                "regex value for '{}' must be a string",
                field
            )));
        }

        self.predicates.push(MetadataPredicate {
            field,
            operator,
            value,
            field_type,
        });
        Ok(self)
    }

    pub fn predicates(&self) -> &[MetadataPredicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
