//! Integration tests for the free-form client.
//!
//! These tests verify extractor-driven item parsing, raw body pass-through,
//! the absence of a default `page` parameter, and extraction failure
//! reporting.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rest_data_client::{ClientError, ClientOptions, DataClientPro};

fn items_client(server: &MockServer) -> DataClientPro {
    DataClientPro::with_parse_data(
        format!("{}/api/items", server.uri()),
        ClientOptions::new(),
        |body: &Value| body.get("items").and_then(Value::as_array).cloned(),
    )
}

#[tokio::test]
async fn test_get_all_applies_the_extractor_and_keeps_the_whole_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": [{"id": 1}], "meta": {"total": 40}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = items_client(&mock_server);
    let items = client.get_all().await.unwrap();

    assert_eq!(items, vec![json!({"id": 1})]);
    // The raw data is the whole response body, not an unwrapped envelope.
    assert_eq!(client.get_raw_data()["meta"]["total"], json!(40));
}

#[tokio::test]
async fn test_get_all_sends_no_page_unless_staged() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = items_client(&mock_server);
    client.get_all().await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn test_get_all_sends_page_when_staged() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = items_client(&mock_server);
    client.page(3).get_all().await.unwrap();
}

#[tokio::test]
async fn test_extractor_returning_none_fails_with_the_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&mock_server)
        .await;

    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let client = DataClientPro::with_parse_data(
        format!("{}/api/items", mock_server.uri()),
        ClientOptions::new().catch_msg(move |msg| sink.lock().unwrap().push(msg.to_string())),
        |body: &Value| body.get("items").and_then(Value::as_array).cloned(),
    );

    let error = client.get_all().await.unwrap_err();

    match error {
        ClientError::Parse { payload } => assert_eq!(payload, json!({"unexpected": true})),
        other => panic!("expected a parse error, got {other:?}"),
    }
    // No msg field on the payload, so the derived message is its text.
    assert_eq!(
        messages.lock().unwrap().as_slice(),
        [r#"{"unexpected":true}"#]
    );
    assert!(client.get_data().is_empty());
}

#[tokio::test]
async fn test_extraction_failure_surfaces_the_payload_msg() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"msg": "server says no"})),
        )
        .mount(&mock_server)
        .await;

    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let client = DataClientPro::with_parse_data(
        format!("{}/api/items", mock_server.uri()),
        ClientOptions::new().catch_msg(move |msg| sink.lock().unwrap().push(msg.to_string())),
        |body: &Value| body.get("items").and_then(Value::as_array).cloned(),
    );

    client.get_all().await.unwrap_err();

    // The payload's own msg field wins over any fallback.
    assert_eq!(messages.lock().unwrap().as_slice(), ["server says no"]);
}

#[tokio::test]
async fn test_without_extractor_a_top_level_array_is_the_item_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}, {"id": "b"}])))
        .mount(&mock_server)
        .await;

    let client = DataClientPro::new(
        format!("{}/api/items", mock_server.uri()),
        ClientOptions::new(),
    );
    let items = client.get_all().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(client.get_raw_data(), json!([{"id": "a"}, {"id": "b"}]));
}

#[tokio::test]
async fn test_without_extractor_an_object_body_yields_no_items() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a"})))
        .mount(&mock_server)
        .await;

    let client = DataClientPro::new(
        format!("{}/api/items", mock_server.uri()),
        ClientOptions::new(),
    );
    let items = client.get_all().await.unwrap();

    assert!(items.is_empty());
    assert_eq!(client.get_raw_data(), json!({"id": "a"}));
}

#[tokio::test]
async fn test_verbs_accept_any_2xx_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/items/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"saved": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = items_client(&mock_server);
    let body = client.id(7).put(Some(json!({"v": 1}))).await.unwrap();
    assert_eq!(body, json!({"saved": true}));
}

#[tokio::test]
async fn test_fetch_current_stores_the_whole_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "v": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = items_client(&mock_server);
    let item = client.current(7).fetch_current().await.unwrap();

    assert_eq!(item, Some(json!({"id": 7, "v": 1})));
    assert_eq!(client.get_current_data(), item);
}
