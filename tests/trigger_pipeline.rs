use std::sync::Arc;

use arfetch::{
    FetchStatus, FetcherConfig, RegistrationJob, RegistrationKind, StaticEnrollmentDirectory,
    TriggerFetcher, TriggerRecord, ValidationLimits,
};
use fetcher::testing::{trigger_response, CapturingMetrics, ScriptedTransport};
use serde_json::{json, Value};
use url::Url;

const REGISTRATION_URI: &str = "https://foo.com/register";

fn app_job() -> RegistrationJob {
    let mut job = RegistrationJob::new(
        RegistrationKind::AppTrigger,
        Url::parse(REGISTRATION_URI).unwrap(),
        Url::parse("android-app://com.example.shop").unwrap(),
    );
    job.ad_id_permission = true;
    job
}

async fn fetch_with(
    config: FetcherConfig,
    job: &RegistrationJob,
    payload: &Value,
) -> (FetchStatus, Option<TriggerRecord>) {
    let transport = ScriptedTransport::new()
        .respond(REGISTRATION_URI, trigger_response(&payload.to_string()));
    let fetcher = TriggerFetcher::new(
        config,
        Arc::new(transport),
        Arc::new(StaticEnrollmentDirectory::new().with_enrollment("foo.com", "enrollment-id")),
        Arc::new(CapturingMetrics::new()),
    )
    .unwrap();
    let report = fetcher.fetch(job).await;
    (report.status(), report.outcome.into_record())
}

async fn fetch(payload: Value) -> (FetchStatus, Option<TriggerRecord>) {
    fetch_with(FetcherConfig::default(), &app_job(), &payload).await
}

fn small_limits() -> FetcherConfig {
    FetcherConfig {
        limits: ValidationLimits {
            max_event_trigger_data: 2,
            max_filters: 2,
            max_filter_key_bytes: 5,
            max_values_per_filter: 2,
            max_filter_value_bytes: 5,
            max_aggregatable_trigger_data: 2,
            max_aggregate_keys_per_registration: 2,
            max_aggregate_key_id_bytes: 5,
            max_aggregate_key_piece_bytes: 6,
            max_aggregate_deduplication_keys: 2,
        },
        ..FetcherConfig::default()
    }
}

#[tokio::test]
async fn full_payload_is_normalized() {
    let (status, record) = fetch(json!({
        "event_trigger_data": [
            {"trigger_data": "2", "priority": "101", "deduplication_key": "7", "unknown": 1},
            {"trigger_data": "3", "filters": {"product": ["1234"]}}
        ],
        "aggregatable_trigger_data": [
            {"key_piece": "0x400", "source_keys": ["campaignCounts"], "filters": {"ctid": ["id"]}}
        ],
        "aggregatable_values": {"campaignCounts": 32768},
        "aggregatable_deduplication_keys": [{"deduplication_key": "10"}],
        "filters": {"product": ["1234", "5678"]},
        "not_filters": [{"ctid": ["id"]}, {"geo": []}],
        "debug_reporting": true,
        "debug_key": "318"
    }))
    .await;

    assert_eq!(status, FetchStatus::Success);
    let record = record.unwrap();
    assert_eq!(
        record.event_trigger_data(),
        r#"[{"trigger_data":"2","priority":"101","deduplication_key":"7"},{"trigger_data":"3","filters":{"product":["1234"]}}]"#
    );
    assert_eq!(
        record.aggregatable_trigger_data(),
        Some(r#"[{"key_piece":"0x400","source_keys":["campaignCounts"],"filters":{"ctid":["id"]}}]"#)
    );
    assert_eq!(record.aggregatable_values(), Some(r#"{"campaignCounts":32768}"#));
    assert_eq!(
        record.aggregatable_deduplication_keys(),
        Some(r#"[{"deduplication_key":"10"}]"#)
    );
    assert_eq!(record.filters(), Some(r#"{"product":["1234","5678"]}"#));
    assert_eq!(record.not_filters(), Some(r#"[{"ctid":["id"]},{"geo":[]}]"#));
    assert_eq!(record.debug_key(), Some(318));
    assert!(record.debug_reporting());
    assert_eq!(record.attribution_destination().as_str(), "android-app://com.example.shop");
    assert_eq!(record.enrollment_id().as_str(), "enrollment-id");
}

#[tokio::test]
async fn unsigned_fields_drop_individually() {
    let (status, record) = fetch(json!({
        "event_trigger_data": [
            {"trigger_data": "18446744073709551616", "priority": "5"},
            {"trigger_data": "-1", "deduplication_key": "abc"},
            {"trigger_data": "18446744073709551615", "deduplication_key": "0"}
        ],
        "debug_key": "18446744073709551616"
    }))
    .await;

    assert_eq!(status, FetchStatus::Success);
    let record = record.unwrap();
    assert_eq!(
        record.event_trigger_data(),
        r#"[{"priority":"5"},{},{"trigger_data":"18446744073709551615","deduplication_key":"0"}]"#
    );
    assert_eq!(record.debug_key(), None);
}

#[tokio::test]
async fn priority_bounds() {
    let (status, record) = fetch(json!({
        "event_trigger_data": [
            {"priority": "-9223372036854775808"},
            {"priority": "9223372036854775807"},
            {"priority": "18446744073709551615"}
        ]
    }))
    .await;

    assert_eq!(status, FetchStatus::Success);
    assert_eq!(
        record.unwrap().event_trigger_data(),
        r#"[{"priority":"-9223372036854775808"},{"priority":"9223372036854775807"},{}]"#
    );
}

#[tokio::test]
async fn too_many_event_trigger_entries_fail() {
    let entries: Vec<Value> = (0..11).map(|i| json!({"trigger_data": i.to_string()})).collect();
    let (status, record) = fetch(json!({ "event_trigger_data": entries })).await;
    assert_eq!(status, FetchStatus::ParsingError);
    assert!(record.is_none());

    let entries: Vec<Value> = (0..10).map(|i| json!({"trigger_data": i.to_string()})).collect();
    let (status, _) = fetch(json!({ "event_trigger_data": entries })).await;
    assert_eq!(status, FetchStatus::Success);
}

#[tokio::test]
async fn each_filter_bound_fails_the_fetch() {
    let config = small_limits();
    let job = app_job();
    let cases = [
        json!({"filters": {"a": [], "b": [], "c": []}}),
        json!({"filters": {"toolong": ["x"]}}),
        json!({"filters": {"a": ["1", "2", "3"]}}),
        json!({"filters": {"a": ["toolong"]}}),
        json!({"not_filters": [{"a": []}, {"toolong": []}]}),
        json!({"event_trigger_data": [{"filters": {"toolong": []}}]}),
        json!({"aggregatable_deduplication_keys": [
            {"deduplication_key": "1", "not_filters": {"a": ["toolong"]}}
        ]}),
    ];
    for payload in cases {
        let (status, record) = fetch_with(config.clone(), &job, &payload).await;
        assert_eq!(status, FetchStatus::ParsingError, "payload {payload}");
        assert!(record.is_none());
    }

    let compliant = json!({"filters": {"ab": ["12345", "x"], "cd": []}});
    let (status, record) = fetch_with(config, &job, &compliant).await;
    assert_eq!(status, FetchStatus::Success);
    assert_eq!(record.unwrap().filters(), Some(r#"{"ab":["12345","x"],"cd":[]}"#));
}

#[tokio::test]
async fn aggregatable_violations_fail_the_fetch() {
    let config = small_limits();
    let job = app_job();
    let cases = [
        // key_piece without the hex prefix
        json!({"aggregatable_trigger_data": [{"key_piece": "400", "source_keys": []}]}),
        // key_piece too long
        json!({"aggregatable_trigger_data": [{"key_piece": "0x12345", "source_keys": []}]}),
        json!({"aggregatable_trigger_data": [{"key_piece": "0x1", "source_keys": "a"}]}),
        json!({"aggregatable_trigger_data": [{"key_piece": "0x1", "source_keys": ["toolong"]}]}),
        // three ids across two entries exceed the job-wide budget of two
        json!({"aggregatable_trigger_data": [
            {"key_piece": "0x1", "source_keys": ["a", "b"]},
            {"key_piece": "0x2", "source_keys": ["c"]}
        ]}),
        json!({"aggregatable_trigger_data": [
            {"key_piece": "0x1", "source_keys": []},
            {"key_piece": "0x2", "source_keys": []},
            {"key_piece": "0x3", "source_keys": []}
        ]}),
        json!({"aggregatable_values": {"a": -1}}),
        json!({"aggregatable_values": {"a": "1"}}),
        json!({"aggregatable_values": {"a": 1, "b": 2, "c": 3}}),
        json!({"aggregatable_values": {"toolong": 1}}),
        json!({"aggregatable_deduplication_keys": [{"deduplication_key": "-1"}]}),
        json!({"aggregatable_deduplication_keys": [{}, {}, {}]}),
    ];
    for payload in cases {
        let (status, record) = fetch_with(config.clone(), &job, &payload).await;
        assert_eq!(status, FetchStatus::ParsingError, "payload {payload}");
        assert!(record.is_none());
    }

    let compliant = json!({
        "aggregatable_trigger_data": [
            {"key_piece": "0xAB12", "source_keys": ["a"]},
            {"key_piece": "0X1", "source_keys": ["b"]}
        ],
        "aggregatable_values": {"a": 0, "b": 65536}
    });
    let (status, _) = fetch_with(config, &job, &compliant).await;
    assert_eq!(status, FetchStatus::Success);
}

#[tokio::test]
async fn debug_key_needs_ad_id_permission() {
    let payload = json!({"debug_key": "42"});

    let (_, record) = fetch_with(FetcherConfig::default(), &app_job(), &payload).await;
    let record = record.unwrap();
    assert_eq!(record.debug_key(), Some(42));
    assert!(record.ad_id_permission());

    let mut job = app_job();
    job.ad_id_permission = false;
    let (status, record) = fetch_with(FetcherConfig::default(), &job, &payload).await;
    assert_eq!(status, FetchStatus::Success);
    assert_eq!(record.unwrap().debug_key(), None);
}

#[tokio::test]
async fn malformed_payload_is_a_parsing_error() {
    let transport = ScriptedTransport::new()
        .respond(REGISTRATION_URI, trigger_response("{\"event_trigger_data\":"));
    let fetcher = TriggerFetcher::new(
        FetcherConfig::default(),
        Arc::new(transport),
        Arc::new(StaticEnrollmentDirectory::new().with_enrollment("foo.com", "enrollment-id")),
        Arc::new(CapturingMetrics::new()),
    )
    .unwrap();
    let report = fetcher.fetch(&app_job()).await;
    assert_eq!(report.status(), FetchStatus::ParsingError);
    assert!(report.outcome.record().is_none());
}
