//! Forgiving scalar readers for spreadsheet-backed payloads
//!
//! Cells arrive as numbers, numeric strings, strings with units, or not at
//! all. Readers here never fail; they fall back to zero/empty.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Leading integer of a cell, clamped at zero.
///
/// `"12 pcs"` → 12, `"-3"` → 0, `4.8` → 4, `"abc"` → 0.
pub fn non_negative_int(value: Option<&Value>) -> u32 {
    let parsed: i64 = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => leading_int(s),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    };
    parsed.clamp(0, i64::from(u32::MAX)) as u32
}

fn leading_int(s: &str) -> i64 {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// Decimal amount; accepts `"12,50 €"` style strings
pub fn decimal(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter_map(|c| match c {
                    ',' => Some('.'),
                    '0'..='9' | '.' | '-' => Some(c),
                    _ => None,
                })
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// Text form of a cell; numbers are rendered, null is empty
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Timestamp cell: RFC 3339, or a bare date taken as UTC midnight.
/// Blank or unparseable cells read as `None`.
pub fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = match value {
        Some(Value::String(s)) => s.trim(),
        _ => return None,
    };
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        })
}

/// Header key folded for matching: lowercase, accents stripped, alphanumerics only
pub fn fold_key(key: &str) -> String {
    key.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
