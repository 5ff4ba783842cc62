//! Service surface tests: health endpoints, login and auth gating.
//!
//! Run with a live PostgreSQL and TEST_DATABASE_URL set:
//! `cargo test -- --ignored`

mod common;

use common::{TestApp, TEST_PASSWORD};
use koperasi_service::models::Role;
use serde_json::json;

#[tokio::test]
#[ignore]
async fn health_and_metrics_respond() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("koperasi_"));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn login_issues_token_that_opens_protected_routes() {
    let app = TestApp::spawn().await;
    app.seed_user("budi", Role::Kasir).await;

    let response = app
        .client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({ "username": "budi", "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    let token = body["access_token"].as_str().expect("No access_token");
    assert_eq!(body["role"], "kasir");

    let response = app
        .client
        .get(format!("{}/me", app.address))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());
    let me: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(me["username"], "budi");

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.seed_user("siti", Role::Anggota).await;

    let response = app
        .client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({ "username": "siti", "password": "salahTotal" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 401);

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn protected_routes_reject_missing_token() {
    let app = TestApp::spawn().await;

    for path in ["/me", "/items", "/sales", "/members"] {
        let response = app
            .client
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), 401, "{} should require auth", path);
    }

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn role_gates_hold() {
    let app = TestApp::spawn().await;
    let (_member, anggota_token) = app.anggota("A-100").await;
    let (_kasir, kasir_token) = app.kasir().await;

    // Member cannot create items
    let response = app
        .client
        .post(format!("{}/items", app.address))
        .bearer_auth(&anggota_token)
        .json(&json!({ "name": "Gula", "stock": 5, "cost_price": "10000", "sale_price": "12000" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 403);

    // Cashier cannot approve deposits
    let response = app
        .client
        .post(format!(
            "{}/deposits/{}/approve",
            app.address,
            uuid::Uuid::new_v4()
        ))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 403);

    app.cleanup().await;
}
