//! Error types produced by the all-or-nothing validators.
//!
//! Every variant here rejects the whole registration payload. Per-field
//! numeric problems never surface as errors; those validators return
//! `Option` and the offending key is dropped instead.
//!
//! Messages carry counts and byte lengths only. Keys and values come from an
//! untrusted server and are never echoed back.
//!
//! | Error | Rejected because |
//! |-------|------------------|
//! | [`TooManyEntries`](ValidationError::TooManyEntries) | A list field exceeds its entry ceiling |
//! | [`FilterTooManyKeys`](ValidationError::FilterTooManyKeys) | A filter map has too many keys |
//! | [`FilterKeyTooLong`](ValidationError::FilterKeyTooLong) | A filter key is too long |
//! | [`FilterTooManyValues`](ValidationError::FilterTooManyValues) | A filter key lists too many values |
//! | [`FilterValueTooLong`](ValidationError::FilterValueTooLong) | A filter value is too long |
//! | [`FilterValueNotString`](ValidationError::FilterValueNotString) | A filter value is not a string |
//! | [`InvalidFilterShape`](ValidationError::InvalidFilterShape) | Filters are neither a map nor a list of maps |
//! | [`InvalidKeyPiece`](ValidationError::InvalidKeyPiece) | Missing prefix or over-long key piece |
//! | [`SourceKeysNotArray`](ValidationError::SourceKeysNotArray) | `source_keys` absent or not a list |
//! | [`TooManyAggregateKeys`](ValidationError::TooManyAggregateKeys) | Key id budget exhausted |
//! | [`InvalidAggregateKeyId`](ValidationError::InvalidAggregateKeyId) | Key id not a string or too long |
//! | [`InvalidAggregatableValue`](ValidationError::InvalidAggregatableValue) | Value is not a non-negative number |
//! | [`InvalidDeduplicationKey`](ValidationError::InvalidDeduplicationKey) | Aggregate dedup key is not an unsigned 64-bit integer |
//! | [`WrongType`](ValidationError::WrongType) | A container has the wrong JSON type |
use thiserror::Error;

/// Reasons a registration payload is rejected as a whole.
///
/// ```rust
/// use validate::ValidationError;
///
/// let err = ValidationError::TooManyEntries {
///     field: "event_trigger_data",
///     count: 11,
///     max: 10,
/// };
/// assert_eq!(err.to_string(), "event_trigger_data has 11 entries, limit is 10");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// A list-valued field has more entries than its configured ceiling.
    #[error("{field} has {count} entries, limit is {max}")]
    TooManyEntries {
        field: &'static str,
        count: usize,
        max: usize,
    },

    #[error("filter map has {count} keys, limit is {max}")]
    FilterTooManyKeys { count: usize, max: usize },

    #[error("filter key is {len} bytes, limit is {max}")]
    FilterKeyTooLong { len: usize, max: usize },

    #[error("filter key lists {count} values, limit is {max}")]
    FilterTooManyValues { count: usize, max: usize },

    #[error("filter value is {len} bytes, limit is {max}")]
    FilterValueTooLong { len: usize, max: usize },

    #[error("filter value is not a string")]
    FilterValueNotString,

    /// Filters must be a map of string lists, or a list of such maps.
    #[error("filters must be an object or an array of objects")]
    InvalidFilterShape,

    /// `key_piece` is missing, is not a string, lacks the `0x` prefix, or is
    /// longer than the configured ceiling.
    #[error("key_piece is invalid")]
    InvalidKeyPiece,

    #[error("source_keys must be an array")]
    SourceKeysNotArray,

    /// The job as a whole names more aggregation key ids than allowed.
    #[error("{count} aggregate keys declared, limit is {max}")]
    TooManyAggregateKeys { count: usize, max: usize },

    #[error("aggregate key id is not a string of at most {max} bytes")]
    InvalidAggregateKeyId { max: usize },

    #[error("aggregatable value is not a non-negative number")]
    InvalidAggregatableValue,

    /// Only the aggregate dedup keys reject the payload; event trigger dedup
    /// keys are dropped individually.
    #[error("aggregatable deduplication_key is not an unsigned 64-bit integer")]
    InvalidDeduplicationKey,

    /// A field was present with a JSON type its consumer cannot read.
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_do_not_echo_payload_text() {
        let err = ValidationError::FilterKeyTooLong { len: 26, max: 25 };
        assert_eq!(err.to_string(), "filter key is 26 bytes, limit is 25");

        let err = ValidationError::WrongType {
            field: "aggregatable_values",
            expected: "an object",
        };
        assert_eq!(err.to_string(), "aggregatable_values must be an object");
    }
}
