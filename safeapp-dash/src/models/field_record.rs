//! Field records ("fiches")
//!
//! One inspected product: marque/modele, ordered photo references,
//! measurements (`cotes`) and notes.

use super::lenient::{text, timestamp};
use chrono::{DateTime, Utc};
use safeapp_common::{CanonicalRow, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted field record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub id: String,
    pub marque: String,
    pub modele: String,
    /// Remote photo references, in display order
    pub photos: Vec<String>,
    pub cotes: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire form as the webhooks actually return it: ids may be numbers, photo
/// lists may be strings, the creation date may still be called `date`.
/// Each timestamp spelling is its own field since rows can carry several.
#[derive(Debug, Deserialize)]
struct RawFieldRecord {
    id: Option<Value>,
    #[serde(default)]
    marque: Option<Value>,
    #[serde(default)]
    modele: Option<Value>,
    #[serde(default)]
    photos: Option<Value>,
    #[serde(default)]
    cotes: Option<Value>,
    #[serde(default)]
    notes: Option<Value>,
    #[serde(default, rename = "createdAt")]
    created_at_camel: Option<Value>,
    #[serde(default)]
    created_at: Option<Value>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default, rename = "updatedAt")]
    updated_at_camel: Option<Value>,
    #[serde(default)]
    updated_at: Option<Value>,
}

impl RawFieldRecord {
    /// `createdAt`, then `created_at`, then `date`
    fn created(&self) -> Option<DateTime<Utc>> {
        timestamp(self.created_at_camel.as_ref())
            .or_else(|| timestamp(self.created_at.as_ref()))
            .or_else(|| timestamp(self.date.as_ref()))
    }

    fn updated(&self) -> Option<DateTime<Utc>> {
        timestamp(self.updated_at_camel.as_ref()).or_else(|| timestamp(self.updated_at.as_ref()))
    }
}

impl FieldRecord {
    /// Decode a canonical row
    pub fn from_row(row: &CanonicalRow) -> Result<Self> {
        let raw: RawFieldRecord = serde_json::from_value(row.clone())
            .map_err(|e| Error::Decode(format!("field record: {}", e)))?;

        let id = text(raw.id.as_ref());
        if id.is_empty() {
            return Err(Error::Decode("field record without id".to_string()));
        }
        let updated = raw.updated();
        let created_at = raw
            .created()
            .or(updated)
            .ok_or_else(|| Error::Decode(format!("field record {} has no timestamp", id)))?;
        let updated_at = updated.unwrap_or(created_at);

        Ok(FieldRecord {
            id,
            marque: text(raw.marque.as_ref()),
            modele: text(raw.modele.as_ref()),
            photos: photo_list(raw.photos),
            cotes: raw.cotes.as_ref().map(raw_text).unwrap_or_default(),
            notes: raw.notes.as_ref().map(raw_text).unwrap_or_default(),
            created_at,
            updated_at,
        })
    }

    /// Decode every row, skipping those that do not describe a record
    pub fn from_rows(rows: Vec<CanonicalRow>) -> Vec<Self> {
        rows.iter()
            .filter_map(|row| match FieldRecord::from_row(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable field record");
                    None
                }
            })
            .collect()
    }

    /// Case-insensitive substring match on marque or modele
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.marque.to_lowercase().contains(&term)
            || self.modele.to_lowercase().contains(&term)
    }
}

/// Free text keeps its line breaks; only numbers need rendering
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn photo_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Object(map) => ["reference", "url", "id"]
                    .iter()
                    .find_map(|key| map.get(*key).map(|v| text(Some(v)))),
                _ => None,
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        // Spreadsheet cells hold either a JSON array or a comma/newline list
        Some(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed @ Value::Array(_)) => photo_list(Some(parsed)),
            _ => s
                .split(|c: char| c == ',' || c == '\n')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_canonical_record() {
        let record = FieldRecord::from_row(&json!({
            "id": "f-1",
            "marque": "Fichet",
            "modele": "F3D",
            "photos": ["ref-a", "ref-b"],
            "cotes": "perçage: 30mm\nentraxe: 70mm",
            "notes": "",
            "createdAt": "2026-03-01T08:00:00Z",
            "updatedAt": "2026-03-02T09:30:00Z"
        }))
        .unwrap();

        assert_eq!(record.id, "f-1");
        assert_eq!(record.photos, vec!["ref-a", "ref-b"]);
        assert_eq!(record.cotes, "perçage: 30mm\nentraxe: 70mm");
        assert!(record.updated_at > record.created_at);
    }

    #[test]
    fn test_decode_sheet_style_record() {
        let record = FieldRecord::from_row(&json!({
            "id": 12,
            "marque": "Abus",
            "modele": "Bravus",
            "photos": "https://x/1.jpg, https://x/2.jpg",
            "date": "2026-01-10T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.id, "12");
        assert_eq!(record.photos.len(), 2);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.notes, "");
    }

    #[test]
    fn test_several_creation_keys_prefer_created_at() {
        // Given: a sheet row that kept `date` and later gained `createdAt`
        let row = json!({
            "id": "a",
            "marque": "Fichet",
            "date": "2026-01-10T10:00:00Z",
            "created_at": "2026-01-11T10:00:00Z",
            "createdAt": "2026-01-12T10:00:00Z"
        });

        // When
        let record = FieldRecord::from_row(&row).unwrap();

        // Then: createdAt wins and stands in for the missing update time
        let expected: DateTime<Utc> = "2026-01-12T10:00:00Z".parse().unwrap();
        assert_eq!(record.created_at, expected);
        assert_eq!(record.updated_at, expected);

        let records = FieldRecord::from_rows(vec![json!({
            "id": "b", "date": "2026-01-10T10:00:00Z", "createdAt": "2026-01-10T10:00:00Z"
        })]);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_blank_timestamp_cells_fall_back() {
        let record = FieldRecord::from_row(&json!({
            "id": 12,
            "marque": "Abus",
            "createdAt": "",
            "date": "2026-01-10T10:00:00Z",
            "updatedAt": ""
        }))
        .unwrap();

        let expected: DateTime<Utc> = "2026-01-10T10:00:00Z".parse().unwrap();
        assert_eq!(record.created_at, expected);
        assert_eq!(record.updated_at, expected);

        // Only an update time: it also becomes the creation time
        let record = FieldRecord::from_row(&json!({
            "id": "c", "date": " ", "updated_at": "2026-02-01T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.created_at, record.updated_at);

        assert!(FieldRecord::from_row(&json!({"id": "d", "date": "", "updatedAt": "n/a"})).is_err());
    }

    #[test]
    fn test_photo_objects_and_json_string() {
        assert_eq!(
            photo_list(Some(json!([{"url": "u1"}, {"reference": "r2"}, 3]))),
            vec!["u1", "r2"]
        );
        assert_eq!(photo_list(Some(json!("[\"a\",\"b\"]"))), vec!["a", "b"]);
        assert!(photo_list(Some(json!(""))).is_empty());
    }

    #[test]
    fn test_missing_id_or_timestamp_is_rejected() {
        assert!(FieldRecord::from_row(&json!({"marque": "x", "date": "2026-01-10T10:00:00Z"})).is_err());
        assert!(FieldRecord::from_row(&json!({"id": "a"})).is_err());
        assert!(FieldRecord::from_row(&json!("not a record")).is_err());
    }

    #[test]
    fn test_from_rows_skips_bad_rows() {
        let records = FieldRecord::from_rows(vec![
            json!({"id": "a", "marque": "Vachette", "date": "2026-01-10T10:00:00Z"}),
            json!({"unrelated": true}),
        ]);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_matches_marque_or_modele() {
        let record = FieldRecord::from_row(&json!({
            "id": "a", "marque": "Sargent", "modele": "8200", "date": "2026-01-10T10:00:00Z"
        }))
        .unwrap();
        assert!(record.matches("sa"));
        assert!(record.matches("820"));
        assert!(record.matches("  "));
        assert!(!record.matches("abus"));
    }
}
