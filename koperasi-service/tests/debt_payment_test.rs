//! Debt payment request and resolution flows.
//!
//! Run with a live PostgreSQL and TEST_DATABASE_URL set:
//! `cargo test -- --ignored`

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
#[ignore]
async fn approval_reduces_hutang() {
    let app = TestApp::spawn().await;
    let (member, anggota_token) = app.anggota("A-301").await;
    let (_kasir, kasir_token) = app.kasir().await;
    app.set_balances(member.member_id, dec!(0), dec!(80000), dec!(0))
        .await;

    let response = app
        .client
        .post(format!("{}/debt-payments", app.address))
        .bearer_auth(&anggota_token)
        .json(&json!({ "nominal": "30000", "source": "cash" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["status"], "pending");
    let payment_id = body["payment_id"].as_str().expect("No payment_id");

    // Hutang untouched while pending.
    assert_eq!(app.get_member(member.member_id).await.hutang, dec!(80000));

    let response = app
        .client
        .post(format!("{}/debt-payments/{}/approve", app.address, payment_id))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    assert_eq!(app.get_member(member.member_id).await.hutang, dec!(50000));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn request_beyond_outstanding_debt_is_rejected() {
    let app = TestApp::spawn().await;
    let (member, anggota_token) = app.anggota("A-302").await;
    app.set_balances(member.member_id, dec!(0), dec!(10000), dec!(0))
        .await;

    let response = app
        .client
        .post(format!("{}/debt-payments", app.address))
        .bearer_auth(&anggota_token)
        .json(&json!({ "nominal": "25000", "source": "cash" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn approval_reverifies_against_current_debt() {
    let app = TestApp::spawn().await;
    let (member, anggota_token) = app.anggota("A-303").await;
    let (_kasir, kasir_token) = app.kasir().await;
    app.set_balances(member.member_id, dec!(0), dec!(50000), dec!(0))
        .await;

    let response = app
        .client
        .post(format!("{}/debt-payments", app.address))
        .bearer_auth(&anggota_token)
        .json(&json!({ "nominal": "50000", "source": "cash" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    let payment_id = body["payment_id"].as_str().expect("No payment_id");

    // Debt shrank between request and approval.
    app.set_balances(member.member_id, dec!(0), dec!(20000), dec!(0))
        .await;

    let response = app
        .client
        .post(format!("{}/debt-payments/{}/approve", app.address, payment_id))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 400);

    // Payment stays pending, balances untouched.
    assert_eq!(app.get_member(member.member_id).await.hutang, dec!(20000));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn second_resolution_conflicts() {
    let app = TestApp::spawn().await;
    let (member, anggota_token) = app.anggota("A-304").await;
    let (_kasir, kasir_token) = app.kasir().await;
    app.set_balances(member.member_id, dec!(0), dec!(40000), dec!(0))
        .await;

    let response = app
        .client
        .post(format!("{}/debt-payments", app.address))
        .bearer_auth(&anggota_token)
        .json(&json!({ "nominal": "40000", "source": "cash" }))
        .send()
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    let payment_id = body["payment_id"].as_str().expect("No payment_id");

    let response = app
        .client
        .post(format!("{}/debt-payments/{}/approve", app.address, payment_id))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    // Rejecting after approval conflicts; hutang is not touched twice.
    let response = app
        .client
        .post(format!("{}/debt-payments/{}/reject", app.address, payment_id))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 409);

    assert_eq!(app.get_member(member.member_id).await.hutang, dec!(0));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn saldo_sourced_payment_debits_saldo_too() {
    let app = TestApp::spawn().await;
    let (member, anggota_token) = app.anggota("A-305").await;
    let (_kasir, kasir_token) = app.kasir().await;
    app.set_balances(member.member_id, dec!(60000), dec!(45000), dec!(0))
        .await;

    let response = app
        .client
        .post(format!("{}/debt-payments", app.address))
        .bearer_auth(&anggota_token)
        .json(&json!({ "nominal": "45000", "source": "saldo" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    let payment_id = body["payment_id"].as_str().expect("No payment_id");

    let response = app
        .client
        .post(format!("{}/debt-payments/{}/approve", app.address, payment_id))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let member = app.get_member(member.member_id).await;
    assert_eq!(member.hutang, dec!(0));
    assert_eq!(member.saldo, dec!(15000));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn saldo_sourced_payment_requires_sufficient_saldo() {
    let app = TestApp::spawn().await;
    let (member, anggota_token) = app.anggota("A-306").await;
    let (_kasir, kasir_token) = app.kasir().await;
    app.set_balances(member.member_id, dec!(10000), dec!(45000), dec!(0))
        .await;

    let response = app
        .client
        .post(format!("{}/debt-payments", app.address))
        .bearer_auth(&anggota_token)
        .json(&json!({ "nominal": "45000", "source": "saldo" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    let payment_id = body["payment_id"].as_str().expect("No payment_id");

    let response = app
        .client
        .post(format!("{}/debt-payments/{}/approve", app.address, payment_id))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 400);

    let member = app.get_member(member.member_id).await;
    assert_eq!(member.hutang, dec!(45000));
    assert_eq!(member.saldo, dec!(10000));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn unknown_status_filter_is_unprocessable() {
    let app = TestApp::spawn().await;
    let (_kasir, kasir_token) = app.kasir().await;

    let response = app
        .client
        .get(format!("{}/debt-payments?status=lunas", app.address))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 422);

    let response = app
        .client
        .get(format!("{}/debt-payments?status=pending", app.address))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}
