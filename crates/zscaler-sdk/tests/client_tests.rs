//! Client tests against a mock Zscaler API.
//!
//! The client is blocking, so every call runs on a blocking thread while the
//! mock server lives on the test runtime.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zscaler_sdk::client::NoopSleeper;
use zscaler_sdk::config::{Config, PaginationConfig};
use zscaler_sdk::{ClientError, Formatted, HttpResponse, ZscalerClient};

fn client_for(uri: &str, token: Option<&str>) -> ZscalerClient {
    let mut config = Config::for_testing(&format!("{uri}/zia/api/v1"));
    config.access_token = token.map(str::to_string);
    ZscalerClient::new(config).unwrap().with_sleeper(Arc::new(NoopSleeper))
}

/// Run a blocking closure off the async runtime. The blocking client must be
/// created, used and dropped inside it.
async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

// =============================================================================
// Requests
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_get_formats_and_authenticates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zia/api/v1/users/42"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "name": "jdoe",
            "adminUser": false,
            "department": {"id": 3, "name": "Engineering"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let value = blocking(move || {
        let client = client_for(&uri, Some("test-token"));
        client.get("/users/42", &[]).map(Formatted::into_value)
    })
    .await;

    let value = value.unwrap().expect("structured");
    assert_eq!(value["admin_user"], false);
    assert_eq!(value["department"]["name"], "Engineering");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_camelizes_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/zia/api/v1/firewallFilteringRules"))
        .and(body_json(json!({"name": "block", "ruleOrder": 1, "routableIP": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "ruleOrder": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let body = json!({"name": "block", "rule_order": 1, "routable_ip": true});
    let value = blocking(move || {
        let client = client_for(&uri, None);
        client.post("firewallFilteringRules", &body).map(Formatted::into_value)
    })
    .await;

    assert_eq!(value.unwrap().expect("structured"), json!({"id": 9, "rule_order": 1}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_response_passes_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/zia/api/v1/users/1"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"code": "RESOURCE_NOT_FOUND"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = blocking(move || {
        let client = client_for(&uri, None);
        client.delete("users/1").map(Formatted::into_raw)
    })
    .await;

    let raw = result.unwrap().expect("raw");
    assert_eq!(raw.status_code(), 404);
    assert!(raw.text().contains("RESOURCE_NOT_FOUND"));
}

// =============================================================================
// Retries
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limited_get_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zia/api/v1/status"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"message": "Rate Limit Exceeded"})),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/zia/api/v1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ACTIVE"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let value = blocking(move || {
        let client = client_for(&uri, None);
        client.get("status", &[]).map(Formatted::into_value)
    })
    .await;

    assert_eq!(value.unwrap().expect("structured"), json!({"status": "ACTIVE"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_gives_up_after_three_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/zia/api/v1/users/5"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = blocking(move || {
        let client = client_for(&uri, None);
        client.put("users/5", &json!({"name": "x"})).map(|_| ())
    })
    .await;

    match result {
        Err(ClientError::RetriesExhausted { status, attempts, body }) => {
            assert_eq!(status, 503);
            assert_eq!(attempts, 4);
            assert_eq!(body, json!("upstream unavailable"));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_request_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/zia/api/v1/locations"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"code": "DUPLICATE_ITEM"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let raw = blocking(move || {
        let client = client_for(&uri, None);
        client.post("locations", &json!({})).map(Formatted::into_raw)
    })
    .await;

    assert_eq!(raw.unwrap().expect("raw").status_code(), 400);
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_paginate_walks_zpa_list_pages() {
    let mock_server = MockServer::start().await;

    for (page, names) in [("1", vec!["a", "b"]), ("2", vec!["c"])] {
        let list: Vec<Value> = names
            .iter()
            .map(|n| json!({"name": n, "serverGroups": []}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/zia/api/v1/appConnectorGroup"))
            .and(query_param("page", page))
            .and(query_param("pageSize", "2"))
            .and(query_param("search", "prod"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"totalPages": "2", "list": list})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/zia/api/v1/appConnectorGroup"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalPages": "2"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let names = blocking(move || {
        let client = client_for(&uri, None);
        let mut payload = Map::new();
        payload.insert("search".to_string(), json!("prod"));
        let config = PaginationConfig {
            page_size: Some(2),
            ..PaginationConfig::default()
        };
        client
            .paginate("appConnectorGroup", payload, Some(config))
            .map(|item| item.map(|v| v["name"].as_str().unwrap_or_default().to_string()))
            .collect::<Result<Vec<_>, _>>()
    })
    .await;

    assert_eq!(names.unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_paginate_surfaces_auth_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zia/api/v1/users"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired token"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let results = blocking(move || {
        let client = client_for(&uri, Some("stale"));
        client.paginate("users", Map::new(), None).collect::<Vec<_>>()
    })
    .await;

    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(ClientError::Status { status: 401, .. })));
}
