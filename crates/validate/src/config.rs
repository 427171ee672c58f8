//! Bounds applied to registration payload fields.
//!
//! [`ValidationLimits`] carries every count and byte-length ceiling the
//! validators enforce. It deserializes from partial documents (missing keys
//! take their defaults), so an operator can override a single bound from a
//! TOML/YAML/JSON config file or the environment.
//!
//! ```rust
//! use validate::ValidationLimits;
//!
//! let limits = ValidationLimits::default();
//! assert_eq!(limits.max_event_trigger_data, 10);
//! limits.validate().expect("defaults are consistent");
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the `0x` prefix every aggregation key piece must carry.
pub const KEY_PIECE_PREFIX_BYTES: usize = 2;

/// Count and length ceilings for trigger registration payloads.
///
/// Byte lengths are measured on the UTF-8 encoding of the string as it
/// appeared in the payload, with no trimming or normalization.
///
/// ```json
/// {
///   "max_event_trigger_data": 10,
///   "max_filters": 50,
///   "max_filter_key_bytes": 25
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum number of entries in `event_trigger_data`.
    pub max_event_trigger_data: usize,

    /// Maximum number of keys in a single filter map.
    pub max_filters: usize,

    /// Maximum byte length of a filter key.
    pub max_filter_key_bytes: usize,

    /// Maximum number of values listed under a single filter key.
    pub max_values_per_filter: usize,

    /// Maximum byte length of a single filter value.
    pub max_filter_value_bytes: usize,

    /// Maximum number of entries in `aggregatable_trigger_data`.
    pub max_aggregatable_trigger_data: usize,

    /// Maximum number of aggregation key ids per registration.
    ///
    /// Applied to the total of `source_keys` across every aggregatable
    /// trigger entry, and separately to the number of keys in
    /// `aggregatable_values`.
    pub max_aggregate_keys_per_registration: usize,

    /// Maximum byte length of an aggregation key id.
    pub max_aggregate_key_id_bytes: usize,

    /// Maximum byte length of a `key_piece`, prefix included.
    pub max_aggregate_key_piece_bytes: usize,

    /// Maximum number of entries in `aggregatable_deduplication_keys`.
    pub max_aggregate_deduplication_keys: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_event_trigger_data: 10,
            max_filters: 50,
            max_filter_key_bytes: 25,
            max_values_per_filter: 50,
            max_filter_value_bytes: 25,
            max_aggregatable_trigger_data: 50,
            max_aggregate_keys_per_registration: 50,
            max_aggregate_key_id_bytes: 25,
            max_aggregate_key_piece_bytes: 34,
            max_aggregate_deduplication_keys: 50,
        }
    }
}

/// Inconsistent [`ValidationLimits`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitsError {
    /// A ceiling was configured as zero, which would reject every payload
    /// that carries the field at all.
    #[error("limit `{0}` must be greater than zero")]
    Zero(&'static str),

    /// The key piece ceiling leaves no room for a digit after the prefix.
    #[error("max_aggregate_key_piece_bytes ({0}) must exceed the 0x prefix length")]
    KeyPieceTooShort(usize),
}

impl ValidationLimits {
    /// Checks that every ceiling is usable.
    pub fn validate(&self) -> Result<(), LimitsError> {
        let named = [
            ("max_event_trigger_data", self.max_event_trigger_data),
            ("max_filters", self.max_filters),
            ("max_filter_key_bytes", self.max_filter_key_bytes),
            ("max_values_per_filter", self.max_values_per_filter),
            ("max_filter_value_bytes", self.max_filter_value_bytes),
            (
                "max_aggregatable_trigger_data",
                self.max_aggregatable_trigger_data,
            ),
            (
                "max_aggregate_keys_per_registration",
                self.max_aggregate_keys_per_registration,
            ),
            ("max_aggregate_key_id_bytes", self.max_aggregate_key_id_bytes),
            (
                "max_aggregate_deduplication_keys",
                self.max_aggregate_deduplication_keys,
            ),
        ];
        if let Some((name, _)) = named.iter().find(|(_, value)| *value == 0) {
            return Err(LimitsError::Zero(name));
        }
        if self.max_aggregate_key_piece_bytes <= KEY_PIECE_PREFIX_BYTES {
            return Err(LimitsError::KeyPieceTooShort(
                self.max_aggregate_key_piece_bytes,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ValidationLimits::default().validate().is_ok());
    }

    #[test]
    fn zero_limit_is_named() {
        let limits = ValidationLimits {
            max_filters: 0,
            ..ValidationLimits::default()
        };
        assert_eq!(limits.validate(), Err(LimitsError::Zero("max_filters")));
    }

    #[test]
    fn key_piece_limit_must_leave_room_for_digits() {
        let limits = ValidationLimits {
            max_aggregate_key_piece_bytes: 2,
            ..ValidationLimits::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(LimitsError::KeyPieceTooShort(2))
        ));
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let limits: ValidationLimits =
            serde_json::from_str(r#"{"max_event_trigger_data": 3}"#).unwrap();
        assert_eq!(limits.max_event_trigger_data, 3);
        assert_eq!(limits.max_filters, 50);
        assert_eq!(limits.max_aggregate_key_piece_bytes, 34);
    }
}
