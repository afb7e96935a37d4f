mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{build_app, build_app_with, json};
use txledger::config::Config;

const COMPLETED: &[&str] = &["status=\"completed\""];

#[tokio::test]
async fn create_returns_persisted_entity() {
    let app = build_app();

    let (response, body) = app
        .post_json(
            "/transactions",
            r#"{"value":150.75,"timestamp":"2025-08-20T14:30:00Z"}"#,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let txn = json(&body);
    assert!(txn["id"].as_i64().unwrap() > 0);
    assert_eq!(txn["value"].as_f64(), Some(150.75));
    assert_eq!(txn["status"], "completed");
    let timestamp: DateTime<Utc> = txn["timestamp"].as_str().unwrap().parse().unwrap();
    assert_eq!(timestamp, "2025-08-20T14:30:00Z".parse::<DateTime<Utc>>().unwrap());
    assert!(txn["created_at"].is_string());
}

#[tokio::test]
async fn create_updates_business_counters() {
    let app = build_app();

    for value in ["150.75", "49.25"] {
        let (response, _) = app
            .post_json(
                "/transactions",
                &format!(r#"{{"value":{},"timestamp":"2025-08-20T14:30:00Z"}}"#, value),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    assert_eq!(app.sample("transactions_total", COMPLETED), 2.0);
    assert_eq!(app.sample("transactions_value_sum", &[]), 200.0);
    assert_eq!(app.sample("transactions_errors_total", &[]), 0.0);
}

#[tokio::test]
async fn non_positive_value_is_rejected_and_counted() {
    let app = build_app();

    for (n, value) in ["-5", "0"].iter().enumerate() {
        let (response, body) = app
            .post_json(
                "/transactions",
                &format!(r#"{{"value":{},"timestamp":"2025-08-20T14:30:00Z"}}"#, value),
            )
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json(&body)["error"],
            "transaction value must be positive"
        );
        assert_eq!(
            app.sample("transactions_errors_total", &[]),
            (n + 1) as f64
        );
    }

    assert!(app.store.is_empty().await);
    assert_eq!(app.sample("transactions_total", COMPLETED), 0.0);
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = build_app();

    for body in [
        "not json",
        r#"{"value":"ten","timestamp":"2025-08-20T14:30:00Z"}"#,
        r#"{"value":10,"timestamp":"yesterday"}"#,
        "",
    ] {
        let (response, payload) = app.post_json("/transactions", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(json(&payload)["error"], "Invalid request body");
    }

    assert_eq!(app.sample("transactions_errors_total", &[]), 4.0);
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn store_failure_on_create_is_500_and_counted() {
    let app = build_app();
    app.store.set_reachable(false);

    let (response, body) = app
        .post_json(
            "/transactions",
            r#"{"value":12.5,"timestamp":"2025-08-20T14:30:00Z"}"#,
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["error"], "Internal server error");
    assert_eq!(app.sample("transactions_errors_total", &[]), 1.0);
    assert_eq!(app.sample("transactions_value_sum", &[]), 0.0);
}

#[tokio::test]
async fn large_valid_body_is_accepted() {
    let app = build_app();
    let padding = " ".repeat(3 * 1024 * 1024);
    let body = format!(
        r#"{{"value":5,{}"timestamp":"2025-08-20T14:30:00Z"}}"#,
        padding
    );

    let (response, payload) = app.post_json("/transactions", &body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json(&payload)["value"].as_f64(), Some(5.0));
    assert_eq!(app.sample("transactions_errors_total", &[]), 0.0);
    assert_eq!(app.sample("transactions_total", COMPLETED), 1.0);
}

#[tokio::test]
async fn body_over_configured_limit_is_rejected_and_counted() {
    let app = build_app_with(Config {
        max_body_bytes: Some(64),
        ..Config::default()
    });
    let body = format!(
        r#"{{"value":5,{}"timestamp":"2025-08-20T14:30:00Z"}}"#,
        " ".repeat(128)
    );

    let (response, payload) = app.post_json("/transactions", &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(&payload)["error"], "Invalid request body");
    assert_eq!(app.sample("transactions_errors_total", &[]), 1.0);
    assert!(app.store.is_empty().await);

    // Bodies under the limit still go through.
    let (response, _) = app
        .post_json(
            "/transactions",
            r#"{"value":5,"timestamp":"2025-08-20T14:30:00Z"}"#,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn offset_timestamps_are_returned_in_utc() {
    let app = build_app();

    let (response, body) = app
        .post_json(
            "/transactions",
            r#"{"value":10,"timestamp":"2025-08-20T14:30:00+02:00"}"#,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json(&body)["timestamp"], "2025-08-20T12:30:00Z");
}

#[tokio::test]
async fn list_defaults_to_fifty_newest_first() {
    let app = build_app();
    for i in 1..=60 {
        let (response, _) = app
            .post_json(
                "/transactions",
                &format!(r#"{{"value":{},"timestamp":"2025-08-20T14:30:00Z"}}"#, i),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let (response, body) = app.get("/transactions").await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = json(&body);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 50);

    let created: Vec<DateTime<Utc>> = rows
        .iter()
        .map(|r| r["created_at"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(created.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(rows[0]["id"].as_i64(), Some(60));
}

#[tokio::test]
async fn out_of_range_pagination_falls_back_to_defaults() {
    let app = build_app();
    for i in 1..=55 {
        app.post_json(
            "/transactions",
            &format!(r#"{{"value":{},"timestamp":"2025-08-20T14:30:00Z"}}"#, i),
        )
        .await;
    }

    let (response, body) = app.get("/transactions?limit=500").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(&body).as_array().unwrap().len(), 50);

    let (_, body) = app.get("/transactions?limit=abc&offset=-4").await;
    let rows = json(&body);
    assert_eq!(rows.as_array().unwrap().len(), 50);
    assert_eq!(rows[0]["id"].as_i64(), Some(55));

    let (_, body) = app.get("/transactions?limit=2&offset=3").await;
    let ids: Vec<i64> = json(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![52, 51]);
}

#[tokio::test]
async fn empty_list_is_an_empty_array() {
    let app = build_app();
    let (response, body) = app.get("/transactions").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "[]");
}

#[tokio::test]
async fn list_store_failure_is_500_without_counting() {
    let app = build_app();
    app.store.set_reachable(false);

    let (response, _) = app.get("/transactions").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.sample("transactions_errors_total", &[]), 0.0);
}

#[tokio::test]
async fn get_returns_existing_transaction() {
    let app = build_app();
    let (_, body) = app
        .post_json(
            "/transactions",
            r#"{"value":42.5,"timestamp":"2025-08-20T14:30:00Z"}"#,
        )
        .await;
    let created = json(&body);
    let id = created["id"].as_i64().unwrap();

    let (response, body) = app.get(&format!("/transactions/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(&body), created);
}

#[tokio::test]
async fn get_missing_transaction_is_404_and_leaves_counters() {
    let app = build_app();
    app.post_json(
        "/transactions",
        r#"{"value":1,"timestamp":"2025-08-20T14:30:00Z"}"#,
    )
    .await;
    let before = (
        app.sample("transactions_total", COMPLETED),
        app.sample("transactions_errors_total", &[]),
        app.sample("transactions_value_sum", &[]),
    );

    let (response, body) = app.get("/transactions/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "transaction not found");

    let (response, _) = app.get("/transactions/not-a-number").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let after = (
        app.sample("transactions_total", COMPLETED),
        app.sample("transactions_errors_total", &[]),
        app.sample("transactions_value_sum", &[]),
    );
    assert_eq!(before, after);
}

#[tokio::test]
async fn get_store_failure_is_500() {
    let app = build_app();
    app.store.set_reachable(false);
    let (response, _) = app.get("/transactions/1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_healthy_store() {
    let app = build_app();
    let (response, body) = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let health = json(&body);
    assert_eq!(health["status"], "healthy");
    let time = health["time"].as_str().unwrap();
    assert!(time.parse::<DateTime<Utc>>().is_ok());
}

#[tokio::test]
async fn health_reports_unreachable_store() {
    let app = build_app();
    app.store.set_reachable(false);

    let (response, body) = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let health = json(&body);
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["error"], "database connection failed");

    // Only the generic request metrics move; business counters stay at zero.
    assert_eq!(app.sample("transactions_errors_total", &[]), 0.0);
    assert_eq!(app.sample("transactions_total", COMPLETED), 0.0);
}
