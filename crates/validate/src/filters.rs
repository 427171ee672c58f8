//! Filter and not-filter bounds.
//!
//! A filter is a map from key to a list of string values. Registrations may
//! send one map, or a list of maps that downstream matching treats as an
//! OR-set. Both shapes are validated map by map and are emitted unchanged,
//! so a compliant filter round-trips byte for byte.
use serde_json::{Map, Value};

use crate::config::ValidationLimits;
use crate::error::ValidationError;

/// Validates a `filters` or `not_filters` value in either accepted shape.
///
/// ```rust
/// use serde_json::json;
/// use validate::{validate_filters, ValidationLimits};
///
/// let limits = ValidationLimits::default();
/// assert!(validate_filters(&json!({"product": ["1234", "234"]}), &limits).is_ok());
/// assert!(validate_filters(&json!([{"a": ["x"]}, {"b": ["y"]}]), &limits).is_ok());
/// assert!(validate_filters(&json!("product"), &limits).is_err());
/// ```
pub fn validate_filters(value: &Value, limits: &ValidationLimits) -> Result<(), ValidationError> {
    match value {
        Value::Object(map) => validate_filter_map(map, limits),
        Value::Array(maps) => maps.iter().try_for_each(|entry| match entry {
            Value::Object(map) => validate_filter_map(map, limits),
            _ => Err(ValidationError::InvalidFilterShape),
        }),
        _ => Err(ValidationError::InvalidFilterShape),
    }
}

/// Validates a single filter map.
pub fn validate_filter_map(
    map: &Map<String, Value>,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    if map.len() > limits.max_filters {
        return Err(ValidationError::FilterTooManyKeys {
            count: map.len(),
            max: limits.max_filters,
        });
    }

    for (key, values) in map {
        if key.len() > limits.max_filter_key_bytes {
            return Err(ValidationError::FilterKeyTooLong {
                len: key.len(),
                max: limits.max_filter_key_bytes,
            });
        }
        let Value::Array(values) = values else {
            return Err(ValidationError::InvalidFilterShape);
        };
        if values.len() > limits.max_values_per_filter {
            return Err(ValidationError::FilterTooManyValues {
                count: values.len(),
                max: limits.max_values_per_filter,
            });
        }
        for value in values {
            let Value::String(text) = value else {
                return Err(ValidationError::FilterValueNotString);
            };
            if text.len() > limits.max_filter_value_bytes {
                return Err(ValidationError::FilterValueTooLong {
                    len: text.len(),
                    max: limits.max_filter_value_bytes,
                });
            }
        }
    }
    Ok(())
}
