//! Trigger record assembly.
//!
//! Walks one accepted payload field by field and builds a [`TriggerRecord`].
//! Sub-objects that fail validation reject the payload; bad scalar values are
//! dropped and assembly continues.
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;
use validate::{
    normalize_event_trigger_data, parse_unsigned64, present,
    validate_aggregatable_deduplication_keys, validate_aggregatable_trigger_data,
    validate_aggregatable_values, validate_filters, ValidationError, ValidationLimits,
    AGGREGATABLE_DEDUPLICATION_KEYS, AGGREGATABLE_TRIGGER_DATA, AGGREGATABLE_VALUES,
    EVENT_TRIGGER_DATA,
};

use crate::destination::DebugKeyDecision;
use crate::enrollment::EnrollmentId;
use crate::types::{RegistrationJob, TriggerRecord};

/// Per-hop facts the record is stamped with.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext<'a> {
    pub job: &'a RegistrationJob,
    pub enrollment_id: &'a EnrollmentId,
    pub attribution_destination: &'a Url,
    pub debug: DebugKeyDecision,
}

/// A payload rejection, tagged with the top-level field that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub field: &'static str,
    pub error: ValidationError,
}

impl Rejection {
    fn at(field: &'static str) -> impl FnOnce(ValidationError) -> Self {
        move |error| Self { field, error }
    }
}

/// Builds a trigger record from an extracted payload.
pub fn assemble_trigger(
    payload: &Map<String, Value>,
    context: &TriggerContext<'_>,
    limits: &ValidationLimits,
) -> Result<TriggerRecord, Rejection> {
    let event_trigger_data = match present(payload, EVENT_TRIGGER_DATA) {
        Some(raw) => normalize_event_trigger_data(raw, limits)
            .map_err(Rejection::at(EVENT_TRIGGER_DATA))?
            .to_string(),
        None => "[]".to_owned(),
    };

    let aggregatable_trigger_data = checked(
        payload,
        AGGREGATABLE_TRIGGER_DATA,
        limits,
        validate_aggregatable_trigger_data,
    )?;
    let aggregatable_values =
        checked(payload, AGGREGATABLE_VALUES, limits, validate_aggregatable_values)?;
    let aggregatable_deduplication_keys = checked(
        payload,
        AGGREGATABLE_DEDUPLICATION_KEYS,
        limits,
        validate_aggregatable_deduplication_keys,
    )?;
    let filters = checked(payload, "filters", limits, validate_filters)?;
    let not_filters = checked(payload, "not_filters", limits, validate_filters)?;

    let debug_reporting = present(payload, "debug_reporting")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let debug_key = match present(payload, "debug_key") {
        Some(raw) => match parse_unsigned64(raw) {
            Some(key) if context.debug.emit_debug_key => Some(key),
            Some(_) => {
                debug!("debug_key withheld, permission not granted");
                None
            }
            None => {
                debug!(field = "debug_key", "invalid unsigned value dropped");
                None
            }
        },
        None => None,
    };

    let job = context.job;
    Ok(TriggerRecord {
        attribution_destination: context.attribution_destination.clone(),
        destination_type: job.destination_type(),
        enrollment_id: context.enrollment_id.clone(),
        registrant: job.registrant.clone(),
        trigger_time: job.requested_at,
        event_trigger_data,
        aggregatable_trigger_data,
        aggregatable_values,
        aggregatable_deduplication_keys,
        filters,
        not_filters,
        debug_key,
        debug_reporting,
        ad_id_permission: job.ad_id_permission,
        debug_permission: context.debug.debug_permission,
    })
}

/// Runs an all-or-nothing validator on an optional field and returns the
/// field's serialization on success.
fn checked(
    payload: &Map<String, Value>,
    field: &'static str,
    limits: &ValidationLimits,
    validator: fn(&Value, &ValidationLimits) -> Result<(), ValidationError>,
) -> Result<Option<String>, Rejection> {
    match present(payload, field) {
        Some(raw) => {
            validator(raw, limits).map_err(Rejection::at(field))?;
            Ok(Some(raw.to_string()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DestinationType, RegistrationKind};
    use serde_json::json;

    struct Fixture {
        job: RegistrationJob,
        enrollment_id: EnrollmentId,
        destination: Url,
    }

    impl Fixture {
        fn new() -> Self {
            let job = RegistrationJob::new(
                RegistrationKind::AppTrigger,
                Url::parse("https://foo.com").unwrap(),
                Url::parse("android-app://com.example").unwrap(),
            );
            Self {
                destination: job.registrant.clone(),
                job,
                enrollment_id: EnrollmentId::new("enrollment-id"),
            }
        }

        fn assemble(
            &self,
            payload: Value,
            emit_debug_key: bool,
        ) -> Result<TriggerRecord, Rejection> {
            let Value::Object(payload) = payload else {
                panic!("fixture payload must be an object");
            };
            let context = TriggerContext {
                job: &self.job,
                enrollment_id: &self.enrollment_id,
                attribution_destination: &self.destination,
                debug: DebugKeyDecision {
                    emit_debug_key,
                    debug_permission: emit_debug_key,
                },
            };
            assemble_trigger(&payload, &context, &ValidationLimits::default())
        }
    }

    #[test]
    fn empty_payload_yields_defaults() {
        let record = Fixture::new().assemble(json!({}), true).unwrap();
        assert_eq!(record.event_trigger_data(), "[]");
        assert_eq!(record.filters(), None);
        assert_eq!(record.aggregatable_values(), None);
        assert_eq!(record.debug_key(), None);
        assert!(!record.debug_reporting());
        assert_eq!(record.destination_type(), DestinationType::App);
        assert_eq!(record.enrollment_id().as_str(), "enrollment-id");
    }

    #[test]
    fn full_payload_round_trips() {
        let payload = json!({
            "event_trigger_data": [{"trigger_data": "2", "priority": "101"}],
            "aggregatable_trigger_data": [
                {"key_piece": "0x400", "source_keys": ["campaignCounts"]}
            ],
            "aggregatable_values": {"campaignCounts": 32768},
            "aggregatable_deduplication_keys": [{"deduplication_key": "10"}],
            "filters": {"product": ["1234"]},
            "not_filters": [{"ctid": ["id"]}],
            "debug_reporting": true,
            "debug_key": "18446744073709551615"
        });
        let record = Fixture::new().assemble(payload, true).unwrap();
        assert_eq!(
            record.event_trigger_data(),
            r#"[{"trigger_data":"2","priority":"101"}]"#
        );
        assert_eq!(
            record.aggregatable_trigger_data(),
            Some(r#"[{"key_piece":"0x400","source_keys":["campaignCounts"]}]"#)
        );
        assert_eq!(
            record.aggregatable_values(),
            Some(r#"{"campaignCounts":32768}"#)
        );
        assert_eq!(
            record.aggregatable_deduplication_keys(),
            Some(r#"[{"deduplication_key":"10"}]"#)
        );
        assert_eq!(record.filters(), Some(r#"{"product":["1234"]}"#));
        assert_eq!(record.not_filters(), Some(r#"[{"ctid":["id"]}]"#));
        assert!(record.debug_reporting());
        assert_eq!(record.debug_key(), Some(u64::MAX));
    }

    #[test]
    fn debug_key_requires_permission() {
        let payload = json!({ "debug_key": "8" });
        let record = Fixture::new().assemble(payload.clone(), false).unwrap();
        assert_eq!(record.debug_key(), None);
        assert!(!record.debug_permission());

        let record = Fixture::new().assemble(payload, true).unwrap();
        assert_eq!(record.debug_key(), Some(8));
    }

    #[test]
    fn invalid_debug_key_is_dropped_not_fatal() {
        let record = Fixture::new()
            .assemble(json!({ "debug_key": "-1", "filters": {"a": ["b"]} }), true)
            .unwrap();
        assert_eq!(record.debug_key(), None);
        assert_eq!(record.filters(), Some(r#"{"a":["b"]}"#));
    }

    #[test]
    fn non_boolean_debug_reporting_is_false() {
        let record = Fixture::new()
            .assemble(json!({ "debug_reporting": "true" }), true)
            .unwrap();
        assert!(!record.debug_reporting());
    }

    #[test]
    fn null_fields_count_as_absent() {
        let record = Fixture::new()
            .assemble(json!({ "filters": null, "event_trigger_data": null }), true)
            .unwrap();
        assert_eq!(record.filters(), None);
        assert_eq!(record.event_trigger_data(), "[]");
    }

    #[test]
    fn rejection_names_the_field() {
        let err = Fixture::new()
            .assemble(json!({ "not_filters": {"a": "b"} }), true)
            .unwrap_err();
        assert_eq!(err.field, "not_filters");
        assert_eq!(err.error, ValidationError::InvalidFilterShape);

        let err = Fixture::new()
            .assemble(json!({ "aggregatable_values": {"a": -1} }), true)
            .unwrap_err();
        assert_eq!(err.field, AGGREGATABLE_VALUES);
    }
}
