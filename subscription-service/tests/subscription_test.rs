//! Integration tests for the subscription CRUD endpoints.
//!
//! Require a reachable PostgreSQL instance (see `TEST_DB_*` in `common`).

mod common;

use common::{TestApp, TEST_USER_ID};
use serde_json::{json, Value};

#[tokio::test]
async fn create_then_get_returns_stored_subscription() {
    let app = TestApp::spawn().await;

    let id = app
        .create_subscription("Yandex Plus", 400, TEST_USER_ID, "07-2025", None)
        .await;

    let response = app.get(&format!("/subscription/{}", id)).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["id"], id);
    assert_eq!(body["service_name"], "Yandex Plus");
    assert_eq!(body["monthly_price"], 400);
    assert_eq!(body["user_id"], TEST_USER_ID);
    assert_eq!(body["start_date"], "07-2025");
    assert!(body["end_date"].is_null());

    app.cleanup().await;
}

#[tokio::test]
async fn create_returns_id_and_message() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/subscription",
            &json!({
                "service_name": "Netflix",
                "monthly_price": 800,
                "user_id": TEST_USER_ID,
                "start_date": "01-2025",
                "end_date": "12-2025"
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["id"].as_i64().is_some());
    assert!(body["message"].as_str().is_some());

    app.cleanup().await;
}

#[tokio::test]
async fn ids_are_distinct() {
    let app = TestApp::spawn().await;

    let first = app
        .create_subscription("Netflix", 100, TEST_USER_ID, "01-2025", None)
        .await;
    let second = app
        .create_subscription("Netflix", 100, TEST_USER_ID, "01-2025", None)
        .await;
    assert_ne!(first, second);

    app.cleanup().await;
}

#[tokio::test]
async fn create_with_missing_fields_returns_field_map() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/subscription", &json!({ "service_name": "Netflix" }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    let errors = &body["errors"];
    assert_eq!(errors["monthly_price"], "field is required");
    assert_eq!(errors["user_id"], "field is required");
    assert_eq!(errors["start_date"], "field is required");
    assert!(errors.get("service_name").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn create_with_bad_month_format_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/subscription",
            &json!({
                "service_name": "Netflix",
                "monthly_price": 400,
                "user_id": TEST_USER_ID,
                "start_date": "2025-07"
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["errors"]["start_date"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn create_with_negative_price_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/subscription",
            &json!({
                "service_name": "Netflix",
                "monthly_price": -1,
                "user_id": TEST_USER_ID,
                "start_date": "07-2025"
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["errors"]["monthly_price"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/subscription"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn get_with_non_integer_id_is_bad_request() {
    let app = TestApp::spawn().await;

    let response = app.get("/subscription/abc").await;
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/subscription/999999").await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn list_returns_all_in_id_order() {
    let app = TestApp::spawn().await;

    let empty: Value = app
        .get("/subscription/all")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(empty.as_array().map(Vec::len), Some(0));

    let a = app
        .create_subscription("Netflix", 100, TEST_USER_ID, "01-2025", None)
        .await;
    let b = app
        .create_subscription("Spotify", 200, TEST_USER_ID, "02-2025", Some("03-2025"))
        .await;

    let response = app.get("/subscription/all").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    let ids: Vec<i64> = body
        .as_array()
        .expect("list should be an array")
        .iter()
        .filter_map(|s| s["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![a, b]);

    app.cleanup().await;
}

#[tokio::test]
async fn update_applies_only_supplied_fields() {
    let app = TestApp::spawn().await;

    let id = app
        .create_subscription("Netflix", 400, TEST_USER_ID, "07-2025", Some("12-2025"))
        .await;

    let response = app
        .put_json(
            "/subscription",
            &json!({ "id": id, "monthly_price": 550, "service_name": "" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["message"].is_string());
    let sub = &body["subscription"];
    assert_eq!(sub["monthly_price"], 550);
    assert_eq!(sub["service_name"], "Netflix");
    assert_eq!(sub["start_date"], "07-2025");
    assert_eq!(sub["end_date"], "12-2025");

    let stored: Value = app
        .get(&format!("/subscription/{}", id))
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(stored, *sub);

    app.cleanup().await;
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .put_json("/subscription", &json!({ "id": 424242, "monthly_price": 10 }))
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let empty_patch = app.put_json("/subscription", &json!({ "id": 424242 })).await;
    assert_eq!(empty_patch.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn update_without_id_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .put_json("/subscription", &json!({ "monthly_price": 10 }))
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["errors"]["id"], "field is required");

    app.cleanup().await;
}

#[tokio::test]
async fn update_moving_end_before_start_is_rejected() {
    let app = TestApp::spawn().await;

    let id = app
        .create_subscription("Netflix", 400, TEST_USER_ID, "07-2025", None)
        .await;

    let response = app
        .put_json("/subscription", &json!({ "id": id, "end_date": "01-2025" }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let stored: Value = app
        .get(&format!("/subscription/{}", id))
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert!(stored["end_date"].is_null());

    app.cleanup().await;
}

#[tokio::test]
async fn delete_removes_subscription() {
    let app = TestApp::spawn().await;

    let id = app
        .create_subscription("Netflix", 400, TEST_USER_ID, "07-2025", None)
        .await;

    let response = app.delete(&format!("/subscription/{}", id)).await;
    assert_eq!(response.status().as_u16(), 200);

    let after = app.get(&format!("/subscription/{}", id)).await;
    assert_eq!(after.status().as_u16(), 404);

    let again = app.delete(&format!("/subscription/{}", id)).await;
    assert_eq!(again.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn malformed_user_id_is_reported_per_field() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/subscription",
            &json!({
                "service_name": "Netflix",
                "monthly_price": "400",
                "user_id": "not-a-uuid",
                "start_date": "07-2025"
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["errors"]["user_id"], "must be a valid UUID");
    assert_eq!(body["errors"]["monthly_price"], "must be a non-negative integer");

    app.cleanup().await;
}
