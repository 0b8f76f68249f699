//! # Filter Predicates
//!
//! Predicates used to select Balade documents for reads, counts and bulk
//! updates. Evaluated against the JSON document view of each record.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};

/// A predicate over a document
#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every document
    All,

    /// Case-insensitive substring match on a text field
    Contains { field: String, pattern: Regex },

    /// Case-insensitive prefix match on a text field
    Prefix { field: String, pattern: Regex },

    /// Field is present and not null
    Exists { field: String },

    /// Field equals a value exactly
    Eq { field: String, value: Value },

    /// Array field holds more than `size` elements
    SizeGreaterThan { field: String, size: usize },

    /// Every sub-filter matches
    And(Vec<Filter>),

    /// At least one sub-filter matches
    Or(Vec<Filter>),
}

impl Filter {
    /// Substring match, ignoring case. `term` is taken literally.
    pub fn contains(field: impl Into<String>, term: &str) -> StoreResult<Self> {
        Ok(Filter::Contains {
            field: field.into(),
            pattern: case_insensitive(&regex::escape(term))?,
        })
    }

    /// Prefix match, ignoring case. `prefix` is taken literally.
    pub fn prefix(field: impl Into<String>, prefix: &str) -> StoreResult<Self> {
        Ok(Filter::Prefix {
            field: field.into(),
            pattern: case_insensitive(&format!("^{}", regex::escape(prefix)))?,
        })
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Filter::Exists {
            field: field.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn size_greater_than(field: impl Into<String>, size: usize) -> Self {
        Filter::SizeGreaterThan {
            field: field.into(),
            size,
        }
    }

    /// Check if a document matches this filter
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Contains { field, pattern } | Filter::Prefix { field, pattern } => doc
                .get(field)
                .map_or(false, |value| text_matches(value, pattern)),
            Filter::Exists { field } => doc.get(field).map_or(false, |value| !value.is_null()),
            Filter::Eq { field, value } => doc.get(field) == Some(value),
            Filter::SizeGreaterThan { field, size } => doc
                .get(field)
                .and_then(Value::as_array)
                .map_or(false, |items| items.len() > *size),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

/// Text match on a string, or on any string element of an array
fn text_matches(value: &Value, pattern: &Regex) -> bool {
    match value {
        Value::String(s) => pattern.is_match(s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|s| pattern.is_match(s)),
        _ => false,
    }
}

fn case_insensitive(pattern: &str) -> StoreResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| StoreError::InvalidPattern(e.to_string()))
}

/// Sort clause
#[derive(Debug, Clone)]
pub struct SortBy {
    pub field: String,
    pub ascending: bool,
}

impl SortBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    /// Order two documents on the sort field. Missing values sort first.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let cmp = compare_json_values(a.get(&self.field), b.get(&self.field));
        if self.ascending {
            cmp
        } else {
            cmp.reverse()
        }
    }
}

fn compare_json_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&b.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None | Some(Value::Null), Some(v)) if !v.is_null() => Ordering::Less,
        (Some(v), None | Some(Value::Null)) if !v.is_null() => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
