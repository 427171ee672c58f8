//! Normalization of `event_trigger_data`.
//!
//! This is the one field that mixes both failure modes. The entry count and
//! nested filters are all-or-nothing; the numeric fields of each entry drop
//! individually, leaving their siblings in place.
//!
//! Numeric fields are re-emitted as decimal strings, and fields the
//! pipeline does not know are not carried over.
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ValidationLimits;
use crate::error::ValidationError;
use crate::filters::validate_filters;
use crate::numeric::{parse_signed64, parse_unsigned64};

pub const EVENT_TRIGGER_DATA: &str = "event_trigger_data";

/// Validates and rewrites `event_trigger_data` into its normalized form.
///
/// ```rust
/// use serde_json::json;
/// use validate::{normalize_event_trigger_data, ValidationLimits};
///
/// let raw = json!([{"trigger_data": "2", "priority": "-101", "deduplication_key": "-3"}]);
/// let normalized = normalize_event_trigger_data(&raw, &ValidationLimits::default()).unwrap();
/// assert_eq!(normalized.to_string(), r#"[{"trigger_data":"2","priority":"-101"}]"#);
/// ```
pub fn normalize_event_trigger_data(
    value: &Value,
    limits: &ValidationLimits,
) -> Result<Value, ValidationError> {
    let Value::Array(entries) = value else {
        return Err(ValidationError::WrongType {
            field: EVENT_TRIGGER_DATA,
            expected: "an array",
        });
    };
    if entries.len() > limits.max_event_trigger_data {
        return Err(ValidationError::TooManyEntries {
            field: EVENT_TRIGGER_DATA,
            count: entries.len(),
            max: limits.max_event_trigger_data,
        });
    }

    let mut normalized = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Value::Object(entry) = entry else {
            debug!(index, "event_trigger_data entry is not an object, skipped");
            continue;
        };
        normalized.push(Value::Object(normalize_entry(index, entry, limits)?));
    }
    Ok(Value::Array(normalized))
}

fn normalize_entry(
    index: usize,
    entry: &Map<String, Value>,
    limits: &ValidationLimits,
) -> Result<Map<String, Value>, ValidationError> {
    let mut out = Map::new();

    if let Some(raw) = present(entry, "trigger_data") {
        match parse_unsigned64(raw) {
            Some(value) => {
                out.insert("trigger_data".to_owned(), Value::String(value.to_string()));
            }
            None => debug!(index, field = "trigger_data", "invalid unsigned value dropped"),
        }
    }

    if let Some(raw) = present(entry, "priority") {
        match parse_signed64(raw) {
            Some(value) => {
                out.insert("priority".to_owned(), Value::String(value.to_string()));
            }
            None => debug!(index, field = "priority", "invalid signed value dropped"),
        }
    }

    if let Some(raw) = present(entry, "deduplication_key") {
        match parse_unsigned64(raw) {
            Some(value) => {
                out.insert(
                    "deduplication_key".to_owned(),
                    Value::String(value.to_string()),
                );
            }
            None => debug!(
                index,
                field = "deduplication_key",
                "invalid unsigned value dropped"
            ),
        }
    }

    for field in ["filters", "not_filters"] {
        if let Some(filters) = present(entry, field) {
            validate_filters(filters, limits)?;
            out.insert(field.to_owned(), filters.clone());
        }
    }

    Ok(out)
}

/// A key counts as absent when missing or explicitly `null`.
pub fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}
