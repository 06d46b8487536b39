//! Webhook response normalization
//!
//! Workflow webhooks answer with whatever shape their last node produced:
//! a bare array, an `{"items": [...]}` wrapper whose elements may carry the
//! record under `json`, an object keyed `"0"`, `"1"`, ... or a single record.
//! Every read passes through [`normalize`] so downstream code only ever sees
//! an ordered `Vec<CanonicalRow>`.
//!
//! Classification happens once, in [`ResponseShape::classify`]. Nothing in
//! here returns an error; unknown shapes degrade to a singleton.

use serde_json::{Map, Value};

/// A record after shape detection. Order in the surrounding sequence is significant.
pub type CanonicalRow = Value;

/// Shape of a raw webhook payload
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// `null`
    Empty,
    /// Already a sequence of records
    Array(Vec<Value>),
    /// `{"items": [...]}`, elements possibly wrapped as `{"json": record}`
    WrappedItems(Vec<Value>),
    /// Object whose keys are all canonical non-negative integers
    IndexedObject(Vec<(u64, Value)>),
    /// Anything else: one record
    SingleRecord(Value),
}

impl ResponseShape {
    /// Classify a raw payload
    pub fn classify(raw: Value) -> Self {
        match raw {
            Value::Null => ResponseShape::Empty,
            Value::Array(rows) => ResponseShape::Array(rows),
            Value::Object(map) => classify_object(map),
            scalar => ResponseShape::SingleRecord(scalar),
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseShape::Empty => "empty",
            ResponseShape::Array(_) => "array",
            ResponseShape::WrappedItems(_) => "wrapped_items",
            ResponseShape::IndexedObject(_) => "indexed_object",
            ResponseShape::SingleRecord(_) => "single_record",
        }
    }

    /// Convert into the canonical ordered sequence
    pub fn into_rows(self) -> Vec<CanonicalRow> {
        match self {
            ResponseShape::Empty => Vec::new(),
            ResponseShape::Array(rows) => rows,
            ResponseShape::WrappedItems(items) => items.into_iter().map(unwrap_json).collect(),
            ResponseShape::IndexedObject(mut entries) => {
                entries.sort_by_key(|(index, _)| *index);
                entries.into_iter().map(|(_, value)| value).collect()
            }
            ResponseShape::SingleRecord(record) => vec![record],
        }
    }
}

fn classify_object(mut map: Map<String, Value>) -> ResponseShape {
    if matches!(map.get("items"), Some(Value::Array(_))) {
        if let Some(Value::Array(items)) = map.remove("items") {
            return ResponseShape::WrappedItems(items);
        }
    }

    if !map.is_empty() && map.keys().all(|key| canonical_index(key).is_some()) {
        let entries = map
            .into_iter()
            .filter_map(|(key, value)| canonical_index(&key).map(|index| (index, value)))
            .collect();
        return ResponseShape::IndexedObject(entries);
    }

    ResponseShape::SingleRecord(Value::Object(map))
}

/// Parse a key as a canonical non-negative integer: digits only, no leading
/// zeros, and its string form must round-trip.
fn canonical_index(key: &str) -> Option<u64> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u64 = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

fn unwrap_json(item: Value) -> Value {
    match item {
        Value::Object(mut map) => match map.remove("json") {
            Some(inner) if !inner.is_null() => inner,
            Some(inner) => {
                map.insert("json".to_string(), inner);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Normalize a raw webhook payload into ordered canonical rows
pub fn normalize(raw: Value) -> Vec<CanonicalRow> {
    let shape = ResponseShape::classify(raw);
    let kind = shape.kind();
    let rows = shape.into_rows();
    tracing::debug!(shape = kind, rows = rows.len(), "Normalized webhook response");
    rows
}
