//! End-to-end tests against a live server.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use request_dispatch::demo::API_KEY_HEADER;

mod common;

#[tokio::test]
async fn test_routes_and_errors_over_http() {
    let server = common::start_server(&common::demo_app()).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "request-dispatch");

    let res = client.get(server.url("/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ROUTE_NOT_FOUND");

    let res = client.post(server.url("/hello/ada")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = client.head(server.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = common::start_server(&common::demo_app()).await;
    let res = reqwest::Client::new()
        .get(server.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
    assert_eq!(res.text().await.unwrap(), "ok");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_json_resource_round_trip() {
    let server = common::start_server(&common::demo_app()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/users"))
        .json(&serde_json::json!({ "name": "linus" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(server.url("/users"))
        .header(API_KEY_HEADER, "demo-key")
        .json(&serde_json::json!({ "name": "linus" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["name"], "linus");

    let id = created["id"].as_u64().unwrap();
    let res = client
        .get(server.url(&format!("/users/{id}")))
        .send()
        .await
        .unwrap();
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched, created);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_form_method_override() {
    let server = common::start_server(&common::demo_app()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/users/1"))
        .header(API_KEY_HEADER, "demo-key")
        .form(&[("_method", "DELETE")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/users/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_graceful_shutdown_stops_server() {
    let server = common::start_server(&common::demo_app()).await;
    let body = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");

    server.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
