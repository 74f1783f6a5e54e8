//! Metadata predicate compiler.
//!
//! Turns a [`MetadataMatcher`] into vendor-specific SQL conditions with
//! bound values. Metadata field names are validated and inlined into JSON
//! path expressions; every caller-supplied value is bound, except booleans,
//! which JSON comparisons need as literal tokens.

use chrono::{DateTime, NaiveDateTime};
use sea_query::{Expr, SimpleExpr, Value};

use super::SqlDatabase;
use crate::interfaces::{EventStoreError, Result};
use crate::matcher::{FieldType, MatchValue, MetadataMatcher, MetadataPredicate, Operator};

/// JSON column predicates are evaluated against.
const METADATA_COLUMN: &str = "metadata";

/// Native columns reachable through `FieldType::MessageProperty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageProperty {
    EventId,
    EventName,
    CreatedAt,
    Position,
}

impl MessageProperty {
    fn resolve(field: &str) -> Result<Self> {
        match field {
            "uuid" | "event_id" => Ok(MessageProperty::EventId),
            "event_name" | "message_name" | "messageName" => Ok(MessageProperty::EventName),
            "created_at" | "createdAt" => Ok(MessageProperty::CreatedAt),
            "no" | "position" => Ok(MessageProperty::Position),
            other => Err(EventStoreError::InvalidArgument(format!(
                "unknown message property '{}'",
                other
            ))),
        }
    }

    fn column(self) -> &'static str {
        match self {
            MessageProperty::EventId => "event_id",
            MessageProperty::EventName => "event_name",
            MessageProperty::CreatedAt => "created_at",
            MessageProperty::Position => "no",
        }
    }

    /// Column expression for comparisons against bound values.
    fn compare_expr<D: SqlDatabase>(self) -> String {
        match self {
            MessageProperty::EventId => text_cast::<D>(self.column()),
            _ => self.column().to_string(),
        }
    }

    fn bind(self, value: &MatchValue) -> Result<Value> {
        match (self, value) {
            (MessageProperty::Position, MatchValue::Int(n)) => Ok((*n).into()),
            (MessageProperty::CreatedAt, MatchValue::String(s)) => Ok(parse_timestamp(s)?.into()),
            (MessageProperty::EventId | MessageProperty::EventName, MatchValue::String(s)) => {
                Ok(s.clone().into())
            }
            (property, value) => Err(EventStoreError::InvalidArgument(format!(
                "unsupported value {:?} for message property '{}'",
                value,
                property.column()
            ))),
        }
    }
}

/// One compiled condition and the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub sql: String,
    pub values: Vec<Value>,
}

/// AND-combined list of compiled conditions, in predicate order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

impl WhereClause {
    /// Compile a matcher against a stream table.
    ///
    /// `indexed_fields` maps metadata keys to generated columns the vendor
    /// layout exposes; such predicates compare the column directly.
    pub fn compile<D: SqlDatabase>(
        matcher: Option<&MetadataMatcher>,
        indexed_fields: &[(&str, &str)],
    ) -> Result<Self> {
        let mut conditions = Vec::new();
        for predicate in matcher.map(MetadataMatcher::predicates).unwrap_or_default() {
            let condition = match predicate.field_type {
                FieldType::Metadata => metadata_condition::<D>(predicate, indexed_fields)?,
                FieldType::MessageProperty => property_condition::<D>(predicate)?,
            };
            conditions.push(condition);
        }
        Ok(Self { conditions })
    }

    /// Compile a matcher against the registry's stream metadata.
    pub fn compile_registry<D: SqlDatabase>(matcher: Option<&MetadataMatcher>) -> Result<Self> {
        if let Some(predicate) = matcher
            .map(MetadataMatcher::predicates)
            .unwrap_or_default()
            .iter()
            .find(|p| p.field_type != FieldType::Metadata)
        {
            return Err(EventStoreError::InvalidArgument(format!(
                "stream name queries only support metadata fields, got message property '{}'",
                predicate.field
            )));
        }
        Self::compile::<D>(matcher, &[])
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Conditions joined with `AND`, as rendered before placeholder numbering.
    pub fn sql(&self) -> String {
        self.conditions
            .iter()
            .map(|c| c.sql.as_str())
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// All bound values in placeholder order.
    pub fn values(&self) -> Vec<Value> {
        self.conditions
            .iter()
            .flat_map(|c| c.values.iter().cloned())
            .collect()
    }

    /// One custom expression per condition, for `and_where`.
    pub fn into_exprs(self) -> Vec<SimpleExpr> {
        self.conditions
            .into_iter()
            .map(|c| Expr::cust_with_values(c.sql, c.values))
            .collect()
    }
}

fn metadata_condition<D: SqlDatabase>(
    predicate: &MetadataPredicate,
    indexed_fields: &[(&str, &str)],
) -> Result<Condition> {
    validate_field_name(&predicate.field)?;

    let indexed_column = indexed_fields
        .iter()
        .find(|(key, _)| *key == predicate.field)
        .map(|(_, column)| column.to_string());
    let (text_field, value_field, number_placeholder) = match indexed_column {
        Some(column) => (column.clone(), column, D::PLACEHOLDER.to_string()),
        None => (
            D::json_text_field(METADATA_COLUMN, &predicate.field),
            D::json_value_field(METADATA_COLUMN, &predicate.field),
            D::json_number_placeholder(),
        ),
    };

    match (&predicate.value, predicate.operator) {
        (MatchValue::String(pattern), Operator::Regex) => Ok(Condition {
            sql: format!("{} {} {}", text_field, D::REGEX_OPERATOR, D::PLACEHOLDER),
            values: vec![pattern.clone().into()],
        }),
        (MatchValue::List(items), operator) => {
            let (field, tokens, values) = if items.iter().all(MatchValue::is_numeric) {
                let values = items.iter().filter_map(number_value).collect::<Vec<_>>();
                (value_field, vec![number_placeholder; values.len()], values)
            } else if items.iter().all(|i| matches!(i, MatchValue::String(_))) {
                let values = items.iter().filter_map(string_value).collect::<Vec<_>>();
                (text_field, vec![D::PLACEHOLDER.to_string(); values.len()], values)
            } else if let Some(literals) = items
                .iter()
                .map(|i| match i {
                    MatchValue::Bool(b) => Some(D::json_bool_literal(*b).to_string()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
            {
                (value_field, literals, Vec::new())
            } else {
                return Err(EventStoreError::InvalidArgument(format!(
                    "value list for '{}' must hold only numbers, only strings or only booleans",
                    predicate.field
                )));
            };
            Ok(Condition {
                sql: format!("{} {} ({})", field, operator.sql(), tokens.join(", ")),
                values,
            })
        }
        (MatchValue::String(s), operator) => Ok(Condition {
            sql: format!("{} {} {}", text_field, operator.sql(), D::PLACEHOLDER),
            values: vec![s.clone().into()],
        }),
        (MatchValue::Bool(b), operator) => Ok(Condition {
            sql: format!(
                "{} {} {}",
                value_field,
                operator.sql(),
                D::json_bool_literal(*b)
            ),
            values: Vec::new(),
        }),
        (number, operator) => Ok(Condition {
            sql: format!("{} {} {}", value_field, operator.sql(), number_placeholder),
            values: number_value(number).into_iter().collect(),
        }),
    }
}

fn property_condition<D: SqlDatabase>(predicate: &MetadataPredicate) -> Result<Condition> {
    let property = MessageProperty::resolve(&predicate.field)?;

    match (&predicate.value, predicate.operator) {
        (MatchValue::String(pattern), Operator::Regex) => Ok(Condition {
            sql: format!(
                "{} {} {}",
                text_cast::<D>(property.column()),
                D::REGEX_OPERATOR,
                D::PLACEHOLDER
            ),
            values: vec![pattern.clone().into()],
        }),
        (MatchValue::List(items), operator) => {
            let values = items
                .iter()
                .map(|item| property.bind(item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Condition {
                sql: format!(
                    "{} {} ({})",
                    property.compare_expr::<D>(),
                    operator.sql(),
                    vec![D::PLACEHOLDER; values.len()].join(", ")
                ),
                values,
            })
        }
        (value, operator) => Ok(Condition {
            sql: format!(
                "{} {} {}",
                property.compare_expr::<D>(),
                operator.sql(),
                D::PLACEHOLDER
            ),
            values: vec![property.bind(value)?],
        }),
    }
}

fn validate_field_name(field: &str) -> Result<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(EventStoreError::InvalidArgument(format!(
            "metadata field '{}' may only contain letters, digits, '_' and '-'",
            field
        )))
    }
}

fn text_cast<D: SqlDatabase>(column: &str) -> String {
    format!("CAST({} AS {})", column, D::TEXT_TYPE)
}

fn number_value(value: &MatchValue) -> Option<Value> {
    match value {
        MatchValue::Int(n) => Some((*n).into()),
        MatchValue::Float(f) => Some((*f).into()),
        _ => None,
    }
}

fn string_value(value: &MatchValue) -> Option<Value> {
    match value {
        MatchValue::String(s) => Some(s.clone().into()),
        _ => None,
    }
}

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM:SS[.ffffff]`, read as UTC.
fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            EventStoreError::InvalidArgument(format!("invalid created_at value '{}'", value))
        })
}
