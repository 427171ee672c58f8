//! Registration payload validators
//!
//! The field-level rules for attribution trigger registrations. Everything in
//! here is pure: a JSON value and a set of [`ValidationLimits`] in, a verdict
//! out. Network handling and record assembly live in the fetcher crate.
//!
//! ## Two failure modes
//!
//! - **Drop-and-continue** - [`parse_unsigned64`], [`parse_signed64`] and
//!   [`normalize_event_trigger_data`]'s per-entry numeric fields. A bad value
//!   removes one key and everything else survives.
//! - **All-or-nothing** - [`validate_filters`], the aggregatable validators,
//!   and the `event_trigger_data` entry count. A violation is a
//!   [`ValidationError`] and the whole registration is rejected.
//!
//! Mixing the two up is the classic bug here, so the signatures keep them
//! apart: `Option` for the first, `Result` for the second.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use validate::{normalize_event_trigger_data, validate_filters, ValidationLimits};
//!
//! let limits = ValidationLimits::default();
//! let event = json!([{"trigger_data": "2", "priority": "not-a-number"}]);
//! let normalized = normalize_event_trigger_data(&event, &limits).unwrap();
//! assert_eq!(normalized.to_string(), r#"[{"trigger_data":"2"}]"#);
//!
//! let filters = json!({"product": ["x".repeat(26)]});
//! assert!(validate_filters(&filters, &limits).is_err());
//! ```
mod aggregatable;
mod config;
mod error;
mod event_trigger;
mod filters;
mod numeric;

pub use crate::aggregatable::{
    is_valid_key_piece, validate_aggregatable_deduplication_keys,
    validate_aggregatable_trigger_data, validate_aggregatable_values, KeyBudget,
    AGGREGATABLE_DEDUPLICATION_KEYS, AGGREGATABLE_TRIGGER_DATA, AGGREGATABLE_VALUES,
};
pub use crate::config::{LimitsError, ValidationLimits, KEY_PIECE_PREFIX_BYTES};
pub use crate::error::ValidationError;
pub use crate::event_trigger::{normalize_event_trigger_data, present, EVENT_TRIGGER_DATA};
pub use crate::filters::{validate_filter_map, validate_filters};
pub use crate::numeric::{parse_signed64, parse_unsigned64};
