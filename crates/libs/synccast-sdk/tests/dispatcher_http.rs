mod common;

use common::{closed_port_url, silent_server, Reply, ScriptedServer};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use synccast_sdk::{
    DispatchResponse, Dispatcher, DispatcherConfig, ErrorKind, QueryParams, SyncCastConfig,
};

fn dispatcher(base_url: &str, retries: u32) -> Dispatcher {
    let mut config = SyncCastConfig::default().with_api_base(base_url);
    config.max_network_retries = retries;
    config.backoff_factor = 0.0;
    config.timeout_ms = 2_000;
    Dispatcher::new(&config)
}

#[test]
fn retries_transient_status_until_success() {
    let server = ScriptedServer::start(vec![
        Reply::json(503, &json!({"detail": "busy"})),
        Reply::json(503, &json!({"detail": "busy"})),
        Reply::json(200, &json!({"ok": true})),
    ]);
    let dispatcher = dispatcher(server.base_url(), 3);

    let response = dispatcher.post("/push/message", Some(&json!({"a": 1})), None).unwrap();
    assert_eq!(response, DispatchResponse::Json(json!({"ok": true})));

    let requests = server.finish();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/push/message");
        assert_eq!(request.json(), json!({"a": 1}));
    }
}

#[test]
fn exhausted_retries_on_status_surface_as_api_error() {
    let server = ScriptedServer::start(vec![
        Reply::raw(503, "text/plain", "down"),
        Reply::raw(503, "text/plain", "down"),
        Reply::raw(503, "text/plain", "still down"),
    ]);
    let dispatcher = dispatcher(server.base_url(), 2);

    let err = dispatcher.get("/control/status", None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.detail("status_code"), Some(&json!(503)));
    assert_eq!(err.detail("body"), Some(&json!("still down")));
    assert_eq!(err.detail("attempts"), Some(&json!(3)));
    assert_eq!(server.finish().len(), 3);
}

#[test]
fn client_errors_are_not_retried() {
    let server = ScriptedServer::start(vec![Reply::json(404, &json!({"detail": "no route"}))]);
    let dispatcher = dispatcher(server.base_url(), 3);

    let err = dispatcher.delete("/data/delete", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.detail("status_code"), Some(&json!(404)));
    let url = err.detail("url").and_then(|value| value.as_str()).unwrap();
    assert!(url.ends_with("/data/delete"));

    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "DELETE");
}

#[test]
fn retry_after_hint_delays_next_attempt() {
    let server = ScriptedServer::start(vec![
        Reply::raw(429, "text/plain", "slow down").with_header("Retry-After", "1"),
        Reply::json(200, &json!({"ok": true})),
    ]);
    let dispatcher = dispatcher(server.base_url(), 1);

    let started = Instant::now();
    dispatcher.get("/control/ping", None, None).unwrap();
    assert!(started.elapsed() >= Duration::from_millis(900));
    assert_eq!(server.finish().len(), 2);
}

#[test]
fn dropped_connection_is_retried() {
    let server = ScriptedServer::start(vec![Reply::hang_up(), Reply::json(200, &json!({"ok": true}))]);
    let dispatcher = dispatcher(server.base_url(), 1);

    let response = dispatcher.get("/control/ping", None, None).unwrap();
    assert_eq!(response, DispatchResponse::Json(json!({"ok": true})));
    let requests = server.finish();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|request| request.path == "/control/ping"));
}

#[test]
fn unusable_url_scheme_is_not_retried() {
    let dispatcher = Dispatcher::from_config(DispatcherConfig {
        base_url: "ftp://files.example".into(),
        retries: 3,
        backoff_factor: 1.0,
        ..DispatcherConfig::default()
    });

    let started = Instant::now();
    let err = dispatcher.post("/push/message", Some(&json!({})), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dispatch);
    assert_eq!(err.detail("attempts"), Some(&json!(1)));
    assert!(started.elapsed() < Duration::from_millis(900));
}

#[test]
fn refused_connection_is_a_dispatch_error() {
    let url = closed_port_url();
    let dispatcher = dispatcher(&url, 1);

    let err = dispatcher.post("/push/typing", Some(&json!({})), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dispatch);
    assert_eq!(err.detail("url"), Some(&json!(format!("{url}/push/typing"))));
    assert_eq!(err.detail("attempts"), Some(&json!(2)));
    assert!(err.detail("error").is_some());
}

#[test]
fn timeout_is_a_dispatch_error() {
    let (url, worker) = silent_server(Duration::from_millis(600));
    let mut dispatcher = dispatcher(&url, 0);
    dispatcher.with_timeout(Duration::from_millis(150));

    let started = Instant::now();
    let err = dispatcher.get("/control/ping", None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dispatch);
    assert!(started.elapsed() < Duration::from_millis(600));
    worker.join().unwrap();
}

#[test]
fn non_json_success_is_returned_as_text() {
    let server = ScriptedServer::start(vec![
        Reply::raw(200, "text/plain", "accepted"),
        Reply::raw(200, "text/plain", "{\"queued\": 2}"),
        Reply::raw(201, "text/plain", ""),
    ]);
    let dispatcher = dispatcher(server.base_url(), 0);

    let first = dispatcher.post("/push/system", None, None).unwrap();
    assert_eq!(first, DispatchResponse::Text("accepted".into()));
    let second = dispatcher.post("/push/system", None, None).unwrap();
    assert_eq!(second, DispatchResponse::Json(json!({"queued": 2})));
    let third = dispatcher.put("/data/update", Some(&json!({"id": 1})), None).unwrap();
    assert_eq!(third, DispatchResponse::Text(String::new()));
    server.finish();
}

#[test]
fn malformed_json_success_is_an_api_error() {
    let server = ScriptedServer::start(vec![Reply::raw(200, "application/json", "{not json")]);
    let dispatcher = dispatcher(server.base_url(), 0);

    let err = dispatcher.get("/control/status", None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.detail("body"), Some(&json!("{not json")));
    server.finish();
}

#[test]
fn redirect_without_location_is_an_api_error() {
    let server = ScriptedServer::start(vec![Reply::raw(302, "text/plain", "moved")]);
    let dispatcher = dispatcher(server.base_url(), 2);

    let err = dispatcher.get("/control/ping", None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.detail("status_code"), Some(&json!(302)));
    assert_eq!(err.detail("body"), Some(&json!("moved")));
    assert_eq!(server.finish().len(), 1);
}

#[test]
fn get_appends_query_parameters() {
    let server = ScriptedServer::start(vec![Reply::json(200, &json!({"items": []}))]);
    let dispatcher = dispatcher(server.base_url(), 0);

    let query = QueryParams::from([
        ("room".to_owned(), "5".to_owned()),
        ("limit".to_owned(), "20".to_owned()),
    ]);
    dispatcher.get("/data/list", Some(&query), None).unwrap();

    let requests = server.finish();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/data/list?limit=20&room=5");
}

#[test]
fn sends_credentials_and_per_call_headers() {
    let server = ScriptedServer::start(vec![Reply::json(200, &json!({"ok": true}))]);
    let mut config = SyncCastConfig::default()
        .with_api_base(format!("{}/", server.base_url()))
        .with_credentials("test_app", "s3cret");
    config.max_network_retries = 0;
    let mut dispatcher = Dispatcher::new(&config);
    dispatcher.with_auth_token("tok").with_headers([("X-Trace", "instance")]);

    let per_call = BTreeMap::from([("X-Trace".to_owned(), "call".to_owned())]);
    dispatcher.post("push/message", Some(&json!({"x": 1})), Some(&per_call)).unwrap();

    let requests = server.finish();
    let request = &requests[0];
    assert_eq!(request.path, "/push/message");
    assert_eq!(request.header("X-App-Id"), Some("test_app"));
    assert_eq!(request.header("X-App-Secret"), Some("s3cret"));
    assert_eq!(request.header("Authorization"), Some("Bearer tok"));
    assert_eq!(request.header("X-Trace"), Some("call"));
    assert_eq!(request.header("Content-Type"), Some("application/json"));
}
