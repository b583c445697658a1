//! Pipeline behavior of `ApiClient` with scripted transports and recording
//! collaborators.

use api_unit::plugins::FnNormalizer;
use api_unit::telemetry::InMemoryEventHandler;
use api_unit::types::HttpItemListener;
use api_unit::{
    ApiClient, ApiEvent, ApiMock, ApiRequest, ApiResponse, CallParams, ClientConfig, ClientHooks,
    Error, EventHandler, EventType, HttpApiRequest, HttpTransportConfig, Payload,
    ResponseNormalizer, Transport, TransportResult,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Transport returning a fixed result and counting its invocations.
struct ScriptedTransport {
    calls: Arc<AtomicUsize>,
    result: TransportResult,
}

impl ScriptedTransport {
    fn new(result: TransportResult) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
                result,
            },
            calls,
        )
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, _request: &dyn ApiRequest) -> TransportResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

struct RecordingHooks {
    log: Log,
}

impl ClientHooks for RecordingHooks {
    fn pre_build_request(&self, _params: &CallParams) {
        self.log.lock().unwrap().push("pre_build".into());
    }

    fn on_event(&self, event: EventType, _request: &dyn ApiRequest, _response: Option<&ApiResponse>) {
        self.log.lock().unwrap().push(format!("internal:{}", event));
    }
}

struct RecordingHandler {
    log: Log,
}

impl EventHandler for RecordingHandler {
    fn handle_event(&self, event: &ApiEvent<'_>) {
        self.log
            .lock()
            .unwrap()
            .push(format!("external:{}", event.name()));
    }
}

/// Request type exposing listener hooks.
#[derive(Debug)]
struct ListeningRequest {
    params: CallParams,
    log: Log,
}

impl ApiRequest for ListeningRequest {
    fn params(&self) -> &CallParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut CallParams {
        &mut self.params
    }

    fn listener(&mut self) -> Option<&mut dyn HttpItemListener> {
        Some(self)
    }
}

impl HttpItemListener for ListeningRequest {
    fn on_pre_execute(&mut self) {
        self.log.lock().unwrap().push("listener:pre_execute".into());
    }

    fn on_post_execute(&mut self) {
        self.log.lock().unwrap().push("listener:post_execute".into());
    }
}

fn client_with(result: TransportResult, config: ClientConfig, log: &Log) -> (ApiClient, Arc<AtomicUsize>) {
    let (transport, calls) = ScriptedTransport::new(result);
    let request_log = log.clone();
    let client = ApiClient::builder()
        .config(config)
        .transport(transport)
        .hooks(Arc::new(RecordingHooks { log: log.clone() }))
        .event_handler(Arc::new(RecordingHandler { log: log.clone() }))
        .request_type("listening", move |_: &Value| {
            Ok(Box::new(ListeningRequest {
                params: CallParams::default(),
                log: request_log.clone(),
            }) as Box<dyn ApiRequest>)
        })
        .unwrap()
        .default_request_type("listening")
        .build()
        .unwrap();
    (client, calls)
}

fn ok_result(status: u16) -> TransportResult {
    TransportResult::success(status, Some(Payload::from("{\"ok\":true}")))
}

#[test]
fn request_before_initialize_is_rejected_without_transport() {
    let log = new_log();
    let (client, calls) = client_with(ok_result(200), ClientConfig::default(), &log);

    let response = client.request(CallParams::new("GET", "/users"));

    assert_eq!(response.status_code, 500);
    assert_eq!(response.reason_phrase, "Error while sending request");
    assert_eq!(
        response.message,
        "API is not operational, check parameters and initialization state."
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(entries(&log).is_empty());
}

#[test]
fn disabled_client_is_rejected_without_transport() {
    let log = new_log();
    let (mut client, calls) = client_with(ok_result(200), ClientConfig::default(), &log);
    client.initialize().unwrap();
    client.set_enabled(false);

    let response = client.request(CallParams::new("GET", "/users"));
    assert_eq!(response.status_code, 500);
    assert_eq!(response.message, "API is not enabled.");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(matches!(client.operability_error(), Some(Error::Operability(_))));

    client.set_enabled(true);
    assert_eq!(client.request(CallParams::new("GET", "/users")).status_code, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn matching_mock_replaces_the_transport() {
    let log = new_log();
    let config = ClientConfig::new().with_mocks(true);
    let (mut client, calls) = client_with(ok_result(200), config, &log);
    client
        .add_mock(
            "static",
            &json!({"name": "users", "pattern": "^/users", "status": 201, "content": {"id": 1}}),
        )
        .unwrap();
    client.initialize().unwrap();

    let response = client.request(CallParams::new("get", "/users/1"));
    assert_eq!(response.status_code, 201);
    assert_eq!(response.json(), Some(json!({"id": 1})));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // non-matching endpoints still reach the transport
    assert_eq!(client.request(CallParams::new("GET", "/orders")).status_code, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(client.remove_mock("users"));
    assert!(!client.remove_mock("users"));
    assert_eq!(client.request(CallParams::new("GET", "/users/1")).status_code, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn mocks_are_ignored_when_disabled() {
    let log = new_log();
    let (mut client, calls) = client_with(ok_result(200), ClientConfig::default(), &log);
    client
        .add_mock("static", &json!({"name": "users", "pattern": "^/users", "status": 418}))
        .unwrap();
    client.initialize().unwrap();

    assert_eq!(client.request(CallParams::new("GET", "/users")).status_code, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn only_the_first_matching_normalizer_applies() {
    let log = new_log();
    let (mut client, _) = client_with(ok_result(200), ClientConfig::default(), &log);
    client
        .register_normalizer_instance(
            FnNormalizer::new("first", "^/users", |mut r: ApiResponse| {
                r.reason_phrase = "first".into();
                r
            })
            .unwrap(),
        )
        .unwrap();
    client
        .register_normalizer_instance(
            FnNormalizer::new("second", "^/users", |mut r: ApiResponse| {
                r.reason_phrase = "second".into();
                r
            })
            .unwrap(),
        )
        .unwrap();
    client.initialize().unwrap();

    let response = client.request(CallParams::new("GET", "/users"));
    assert_eq!(response.reason_phrase, "first");

    assert!(client.unregister_normalizer("first"));
    assert!(!client.unregister_normalizer("first"));
    let response = client.request(CallParams::new("GET", "/users"));
    assert_eq!(response.reason_phrase, "second");
}

#[test]
fn json_normalizer_by_type_key() {
    let log = new_log();
    let (mut client, _) = client_with(ok_result(200), ClientConfig::default(), &log);
    client
        .register_normalizer("json", &json!({"rule": "decode", "pattern": "^/"}))
        .unwrap();
    client.initialize().unwrap();

    let response = client.request(CallParams::new("GET", "/users"));
    assert_eq!(response.content, Some(Payload::Json(json!({"ok": true}))));
}

#[test]
fn normalizers_are_skipped_on_failure() {
    let log = new_log();
    let (mut client, _) = client_with(
        TransportResult::failure("Transport error: connection refused"),
        ClientConfig::default(),
        &log,
    );
    client
        .register_normalizer_instance(
            FnNormalizer::new("tag", ".*", |mut r: ApiResponse| {
                r.reason_phrase = "normalized".into();
                r
            })
            .unwrap(),
        )
        .unwrap();
    client.initialize().unwrap();

    let response = client.request(CallParams::new("GET", "/users"));
    assert_eq!(response.status_code, 500);
    assert_eq!(response.message, "Transport error: connection refused");
    assert_eq!(response.reason_phrase, "");
}

#[test]
fn zero_status_on_success_becomes_500() {
    let log = new_log();
    let zero = TransportResult {
        status: 0,
        content: None,
        error: false,
        message: String::new(),
    };
    let config = ClientConfig::new().with_events(true);
    let (mut client, _) = client_with(zero, config, &log);
    client.initialize().unwrap();

    let response = client.request(CallParams::new("GET", "/users"));
    assert_eq!(response.status_code, 500);
    assert!(response.message.is_empty());
    assert!(entries(&log).contains(&"internal:api.execution_success".to_string()));
}

#[test]
fn custom_data_is_echoed_on_both_paths() {
    let data = json!({"trace": "abc", "n": 3});

    let log = new_log();
    let (mut ok_client, _) = client_with(ok_result(204), ClientConfig::default(), &log);
    ok_client.initialize().unwrap();
    let response = ok_client.request(CallParams::new("GET", "/a").with_custom_data(data.clone()));
    assert_eq!(response.custom_data, Some(data.clone()));

    let (mut failing, _) = client_with(
        TransportResult::failure("Transport error: Unknown"),
        ClientConfig::default(),
        &log,
    );
    failing.initialize().unwrap();
    let response = failing.request(CallParams::new("GET", "/a").with_custom_data(data.clone()));
    assert_eq!(response.status_code, 500);
    assert_eq!(response.custom_data, Some(data));
}

#[test]
fn success_notification_order() {
    let log = new_log();
    let config = ClientConfig::new().with_events(true).with_listeners(true);
    let (mut client, _) = client_with(ok_result(200), config, &log);
    client.initialize().unwrap();

    client.request(CallParams::new("GET", "/users"));

    assert_eq!(
        entries(&log),
        vec![
            "pre_build",
            "internal:api.pre_execute",
            "external:api.pre_execute",
            "listener:pre_execute",
            "internal:api.execution_success",
            "external:api.execution_success",
            "internal:api.post_execute",
            "external:api.post_execute",
            "listener:post_execute",
        ]
    );
}

#[test]
fn failure_notification_order() {
    let log = new_log();
    let config = ClientConfig::new().with_events(true).with_listeners(true);
    let (mut client, _) = client_with(TransportResult::failure("boom"), config, &log);
    client.initialize().unwrap();

    client.request(CallParams::new("GET", "/users"));

    assert_eq!(
        entries(&log),
        vec![
            "pre_build",
            "internal:api.pre_execute",
            "external:api.pre_execute",
            "listener:pre_execute",
            "internal:api.execution_error",
            "external:api.execution_error",
            "internal:api.post_execute",
            "external:api.post_execute",
            "listener:post_execute",
        ]
    );
}

#[test]
fn events_disabled_leaves_listeners_only() {
    let log = new_log();
    let config = ClientConfig::new().with_events(false).with_listeners(true);
    let (mut client, _) = client_with(ok_result(200), config, &log);
    client.initialize().unwrap();

    client.request(CallParams::new("GET", "/users"));
    assert_eq!(
        entries(&log),
        vec!["pre_build", "listener:pre_execute", "listener:post_execute"]
    );
}

#[test]
fn in_memory_handler_sees_statuses() {
    let handler = InMemoryEventHandler::shared();
    let (transport, _) = ScriptedTransport::new(ok_result(202));
    let mut client = ApiClient::builder()
        .api_param("base_url", "https://api.example.com")
        .config(ClientConfig::new().with_events(true))
        .transport(transport)
        .event_handler(handler.clone())
        .build()
        .unwrap();
    client.initialize().unwrap();

    client.request(CallParams::new("post", "/jobs"));

    let events = handler.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].status, None);
    assert_eq!(events[1].name, "api.execution_success");
    assert_eq!(events[1].method, "POST");
    assert_eq!(events[2].status, Some(202));
}

#[test]
fn duplicate_mock_keeps_the_first_entry() {
    let log = new_log();
    let (mut client, _) = client_with(ok_result(200), ClientConfig::default(), &log);
    client
        .add_mock("static", &json!({"name": "users", "pattern": "^/users", "status": 201}))
        .unwrap();

    let err = client
        .add_mock("static", &json!({"name": "users", "pattern": "^/other", "status": 404}))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { kind: "mock", .. }));

    let kept = client.mocks().get("users").unwrap();
    assert_eq!(kept.status(), 201);
    assert!(kept.matches("/users/2"));
    assert_eq!(client.mocks().len(), 1);
}

#[test]
fn duplicate_normalizer_rule_is_rejected() {
    let log = new_log();
    let (mut client, _) = client_with(ok_result(200), ClientConfig::default(), &log);
    client
        .register_normalizer("json", &json!({"rule": "decode", "pattern": "^/a"}))
        .unwrap();
    let err = client
        .register_normalizer("json", &json!({"rule": "decode", "pattern": "^/b"}))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { kind: "normalizer", .. }));
    assert!(client.normalizers().get("decode").unwrap().matches("/a"));
}

#[test]
fn empty_keys_are_configuration_errors() {
    let log = new_log();
    let (mut client, _) = client_with(ok_result(200), ClientConfig::default(), &log);

    let err = client
        .add_mock("static", &json!({"name": "", "pattern": "^/"}))
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert!(client.mocks().is_empty());

    let err = client
        .register_normalizer("json", &json!({"rule": "", "pattern": "^/"}))
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert!(client.normalizers().is_empty());
}

#[test]
fn unknown_plugin_type_is_a_configuration_error() {
    let log = new_log();
    let (mut client, _) = client_with(ok_result(200), ClientConfig::default(), &log);
    let err = client.add_mock("recorded", &json!({})).unwrap_err();
    assert!(err.is_setup_error());
}

#[test]
fn build_failure_becomes_500_with_last_error() {
    let (transport, calls) = ScriptedTransport::new(ok_result(200));
    let mut client = ApiClient::builder()
        .transport(transport)
        .transport_config(HttpTransportConfig::new())
        .build()
        .unwrap();
    client.initialize().unwrap();

    // relative endpoint and no base_url
    let response = client.request(CallParams::new("get", "/users"));
    assert_eq!(response.status_code, 500);
    assert_eq!(response.reason_phrase, "Error while building request");
    assert_eq!(
        response.message,
        "Unable to build GET request for endpoint \"/users\""
    );
    assert!(client.request_factory().last_error().contains("base URL"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn async_requests_are_stubbed() {
    let log = new_log();
    let config = ClientConfig::new().with_events(true);
    let (mut client, calls) = client_with(ok_result(200), config, &log);
    client.initialize().unwrap();

    let response = client.request(
        CallParams::new("GET", "/users")
            .with_async(true)
            .with_custom_data(json!(1)),
    );
    assert_eq!(response.status_code, 500);
    assert_eq!(response.message, "Asynchronous execution is not implemented");
    assert_eq!(response.custom_data, Some(json!(1)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(entries(&log), vec!["pre_build"]);
}

#[test]
fn execute_request_dispatches_prebuilt_requests() {
    let log = new_log();
    let (mut client, calls) = client_with(ok_result(200), ClientConfig::default(), &log);

    let response = client.execute_request(None);
    assert_eq!(response.reason_phrase, "Error while building request");
    client.initialize().unwrap();

    let response = client.execute_request(None);
    assert_eq!(response.status_code, 500);
    assert_eq!(response.message, "Request is not well formed");

    let request = client
        .request_factory()
        .create("listening", &Value::Null, CallParams::new("delete", "/users/9"))
        .unwrap();
    assert_eq!(request.method(), "DELETE");
    let response = client.execute_request(Some(request));
    assert_eq!(response.status_code, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Transport recording the method of every request it receives.
struct MethodRecorder {
    seen: Log,
}

impl Transport for MethodRecorder {
    fn execute(&self, request: &dyn ApiRequest) -> TransportResult {
        self.seen.lock().unwrap().push(request.method().to_string());
        ok_result(200)
    }
}

#[test]
fn prebuilt_requests_reach_the_transport_with_uppercase_methods() {
    let seen = new_log();
    let mut client = ApiClient::builder()
        .transport(MethodRecorder { seen: seen.clone() })
        .build()
        .unwrap();
    client.initialize().unwrap();

    let mut request = HttpApiRequest::new().with_base_url("https://api.example.com");
    *request.params_mut() = CallParams::new("put", "/x").with_body("payload");
    request.build().unwrap();

    let response = client.execute_request(Some(Box::new(request)));
    assert_eq!(response.status_code, 200);
    assert_eq!(entries(&seen), vec!["PUT"]);
}

#[test]
fn secured_flag_is_passed_through_untouched() {
    let log = new_log();
    let (mut client, calls) = client_with(ok_result(200), ClientConfig::default(), &log);
    client.initialize().unwrap();

    let response = client.request(CallParams::new("GET", "/users").with_secured(true));
    assert_eq!(response.status_code, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
