//! All-or-nothing validation for the aggregate reporting fields.
//!
//! `aggregatable_trigger_data`, `aggregatable_values` and
//! `aggregatable_deduplication_keys` are never partially accepted: any
//! violation rejects the whole registration. On success the input value is
//! emitted as received.
use serde_json::{Map, Value};

use crate::config::ValidationLimits;
use crate::error::ValidationError;
use crate::filters::validate_filters;
use crate::numeric::parse_unsigned64;

/// Field name used in errors and logs.
pub const AGGREGATABLE_TRIGGER_DATA: &str = "aggregatable_trigger_data";
pub const AGGREGATABLE_VALUES: &str = "aggregatable_values";
pub const AGGREGATABLE_DEDUPLICATION_KEYS: &str = "aggregatable_deduplication_keys";

/// Running count of aggregation key ids declared by one registration.
///
/// `source_keys` lists are small individually but a registration may carry
/// many entries, so the ceiling applies to the sum.
#[derive(Debug, Clone, Copy)]
pub struct KeyBudget {
    used: usize,
    max: usize,
}

impl KeyBudget {
    pub fn new(max: usize) -> Self {
        Self { used: 0, max }
    }

    /// Consumes `count` ids, failing once the total passes the ceiling.
    pub fn charge(&mut self, count: usize) -> Result<(), ValidationError> {
        self.used = self.used.saturating_add(count);
        if self.used > self.max {
            return Err(ValidationError::TooManyAggregateKeys {
                count: self.used,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

/// Returns `true` when `piece` is a `0x`/`0X`-prefixed string no longer than
/// `max_bytes`.
///
/// Only the prefix and length are checked here; the hex digits themselves
/// are interpreted by the aggregation service.
pub fn is_valid_key_piece(piece: &str, max_bytes: usize) -> bool {
    (piece.starts_with("0x") || piece.starts_with("0X")) && piece.len() <= max_bytes
}

/// Validates `aggregatable_trigger_data`.
///
/// ```rust
/// use serde_json::json;
/// use validate::{validate_aggregatable_trigger_data, ValidationLimits};
///
/// let data = json!([{
///     "key_piece": "0x400",
///     "source_keys": ["campaignCounts"],
///     "filters": {"product": ["1234"]}
/// }]);
/// assert!(validate_aggregatable_trigger_data(&data, &ValidationLimits::default()).is_ok());
/// ```
pub fn validate_aggregatable_trigger_data(
    value: &Value,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    let Value::Array(entries) = value else {
        return Err(ValidationError::WrongType {
            field: AGGREGATABLE_TRIGGER_DATA,
            expected: "an array",
        });
    };
    if entries.len() > limits.max_aggregatable_trigger_data {
        return Err(ValidationError::TooManyEntries {
            field: AGGREGATABLE_TRIGGER_DATA,
            count: entries.len(),
            max: limits.max_aggregatable_trigger_data,
        });
    }

    let mut budget = KeyBudget::new(limits.max_aggregate_keys_per_registration);
    for entry in entries {
        let Value::Object(entry) = entry else {
            return Err(ValidationError::WrongType {
                field: AGGREGATABLE_TRIGGER_DATA,
                expected: "an array of objects",
            });
        };
        validate_trigger_data_entry(entry, limits, &mut budget)?;
    }
    Ok(())
}

fn validate_trigger_data_entry(
    entry: &Map<String, Value>,
    limits: &ValidationLimits,
    budget: &mut KeyBudget,
) -> Result<(), ValidationError> {
    match entry.get("key_piece") {
        Some(Value::String(piece))
            if is_valid_key_piece(piece, limits.max_aggregate_key_piece_bytes) => {}
        _ => return Err(ValidationError::InvalidKeyPiece),
    }

    let Some(Value::Array(source_keys)) = entry.get("source_keys") else {
        return Err(ValidationError::SourceKeysNotArray);
    };
    budget.charge(source_keys.len())?;
    for key in source_keys {
        match key {
            Value::String(id) if id.len() <= limits.max_aggregate_key_id_bytes => {}
            _ => {
                return Err(ValidationError::InvalidAggregateKeyId {
                    max: limits.max_aggregate_key_id_bytes,
                })
            }
        }
    }

    validate_nested_filters(entry, limits)
}

/// Validates `aggregatable_values`: a map from key id to a non-negative
/// numeric contribution. Fractional and exponent forms are accepted.
pub fn validate_aggregatable_values(
    value: &Value,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    let Value::Object(values) = value else {
        return Err(ValidationError::WrongType {
            field: AGGREGATABLE_VALUES,
            expected: "an object",
        });
    };
    KeyBudget::new(limits.max_aggregate_keys_per_registration).charge(values.len())?;

    for (id, contribution) in values {
        if id.len() > limits.max_aggregate_key_id_bytes {
            return Err(ValidationError::InvalidAggregateKeyId {
                max: limits.max_aggregate_key_id_bytes,
            });
        }
        match contribution {
            Value::Number(number) if is_non_negative(number) => {}
            _ => return Err(ValidationError::InvalidAggregatableValue),
        }
    }
    Ok(())
}

fn is_non_negative(number: &serde_json::Number) -> bool {
    number
        .as_f64()
        .is_some_and(|value| value.is_finite() && value >= 0.0)
}

/// Validates `aggregatable_deduplication_keys`.
///
/// Each entry must carry an unsigned 64-bit `deduplication_key`; unlike the
/// event trigger dedup key, an invalid one rejects the registration.
pub fn validate_aggregatable_deduplication_keys(
    value: &Value,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    let Value::Array(entries) = value else {
        return Err(ValidationError::WrongType {
            field: AGGREGATABLE_DEDUPLICATION_KEYS,
            expected: "an array",
        });
    };
    if entries.len() > limits.max_aggregate_deduplication_keys {
        return Err(ValidationError::TooManyEntries {
            field: AGGREGATABLE_DEDUPLICATION_KEYS,
            count: entries.len(),
            max: limits.max_aggregate_deduplication_keys,
        });
    }

    for entry in entries {
        let Value::Object(entry) = entry else {
            return Err(ValidationError::WrongType {
                field: AGGREGATABLE_DEDUPLICATION_KEYS,
                expected: "an array of objects",
            });
        };
        if entry
            .get("deduplication_key")
            .and_then(parse_unsigned64)
            .is_none()
        {
            return Err(ValidationError::InvalidDeduplicationKey);
        }
        validate_nested_filters(entry, limits)?;
    }
    Ok(())
}

fn validate_nested_filters(
    entry: &Map<String, Value>,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    for field in ["filters", "not_filters"] {
        match entry.get(field) {
            None | Some(Value::Null) => {}
            Some(filters) => validate_filters(filters, limits)?,
        }
    }
    Ok(())
}
