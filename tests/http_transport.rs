//! `HttpTransport` end to end against a local mock HTTP server.

use api_unit::transport::{OptionKey, TransportOptions};
use api_unit::{
    ApiClient, ApiRequest, CallParams, ClientConfig, HttpApiRequest, HttpTransport,
    HttpTransportConfig, Transport,
};
use mockito::{Matcher, Server};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client_for(base_url: &str) -> ApiClient {
    init_tracing();
    let mut client = ApiClient::builder()
        .api_param("base_url", base_url)
        .config(ClientConfig::default())
        .transport_config(
            HttpTransportConfig::new()
                .with_default_options(TransportOptions::new().with(OptionKey::TimeoutMs, 5_000u64)),
        )
        .build()
        .unwrap();
    client.initialize().unwrap();
    client
}

#[test]
fn get_with_query_and_headers() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/users")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("q".into(), "a b".into()),
        ]))
        .match_header("x-trace", "abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"users":[]}"#)
        .create();

    let client = client_for(&server.url());
    let response = client.request(
        CallParams::new("get", "/users")
            .with_query("page", "2")
            .with_query("q", "a b")
            .with_header("x-trace", "abc"),
    );

    mock.assert();
    assert_eq!(response.status_code, 200);
    assert!(response.message.is_empty());
    assert_eq!(response.json(), Some(json!({"users": []})));
}

#[test]
fn put_attaches_the_body() {
    let mut server = Server::new();
    let mock = server
        .mock("PUT", "/users/7")
        .match_body("name=ada")
        .with_status(204)
        .create();

    let client = client_for(&server.url());
    let response = client.request(CallParams::new("put", "/users/7").with_body("name=ada"));

    mock.assert();
    assert_eq!(response.status_code, 204);
}

#[test]
fn post_sends_json_body() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/jobs")
        .match_body(Matcher::Json(json!({"kind": "export"})))
        .with_status(201)
        .with_body("created")
        .create();

    let client = client_for(&server.url());
    let response = client.request(CallParams::new("POST", "/jobs").with_body(json!({"kind": "export"})));

    mock.assert();
    assert_eq!(response.status_code, 201);
    assert_eq!(response.text().as_deref(), Some("created"));
}

#[test]
fn custom_methods_pass_through() {
    let mut server = Server::new();
    let mock = server.mock("PATCH", "/users/7").with_status(200).create();

    let client = client_for(&server.url());
    let response = client.request(CallParams::new("patch", "/users/7"));

    mock.assert();
    assert_eq!(response.status_code, 200);
}

#[test]
fn http_error_status_is_not_a_transport_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("nope")
        .create();

    let client = client_for(&server.url());
    let response = client.request(CallParams::new("GET", "/missing").with_custom_data(json!("ctx")));

    assert_eq!(response.status_code, 404);
    assert!(response.message.is_empty());
    assert_eq!(response.text().as_deref(), Some("nope"));
    assert_eq!(response.custom_data, Some(json!("ctx")));
}

#[test]
fn unreachable_host_is_reported_as_500() {
    // port 1 is reserved and not listening
    let client = client_for("http://127.0.0.1:1");
    let response = client.request(CallParams::new("GET", "/users"));

    assert_eq!(response.status_code, 500);
    assert!(response.message.starts_with("Transport error:"));
    assert!(response.content.is_none());
}

#[test]
fn transport_can_run_without_a_client() {
    let mut server = Server::new();
    let mock = server.mock("DELETE", "/users/3").with_status(202).create();

    let mut request = HttpApiRequest::new().with_base_url(server.url());
    *request.params_mut() = CallParams::new("DELETE", "/users/3");
    request.build().unwrap();

    let result = HttpTransport::new(HttpTransportConfig::new()).execute(&request);
    mock.assert();
    assert_eq!(result.status, 202);
    assert!(!result.error);
}
