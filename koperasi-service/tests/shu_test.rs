//! SHU distribution and topup flows.
//!
//! Run with a live PostgreSQL and TEST_DATABASE_URL set:
//! `cargo test -- --ignored`

mod common;

use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::str::FromStr;

fn as_decimal(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("expected a decimal string"))
        .expect("invalid decimal string")
}

#[tokio::test]
#[ignore]
async fn distribution_splits_and_credits_the_member_share() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let (member, _) = app.anggota("A-401").await;

    let response = app
        .client
        .post(format!("{}/shu/distributions", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({
            "member_id": member.member_id,
            "year": 2025,
            "amount": "100000"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(as_decimal(&body["share_60"]), dec!(60000));
    assert_eq!(as_decimal(&body["share_10"]), dec!(10000));
    assert_eq!(as_decimal(&body["share_30"]), dec!(30000));

    assert_eq!(app.get_member(member.member_id).await.shu, dec!(60000.00));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn rerun_for_same_member_and_year_conflicts() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let (member, _) = app.anggota("A-402").await;

    let payload = json!({
        "member_id": member.member_id,
        "year": 2024,
        "amount": "50000"
    });

    let response = app
        .client
        .post(format!("{}/shu/distributions", app.address))
        .bearer_auth(&admin_token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);

    let response = app
        .client
        .post(format!("{}/shu/distributions", app.address))
        .bearer_auth(&admin_token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 409);

    // The member share was credited exactly once.
    assert_eq!(app.get_member(member.member_id).await.shu, dec!(30000.00));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn uneven_amount_splits_exactly_with_remainder_to_member_share() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let (member, _) = app.anggota("A-403").await;

    let response = app
        .client
        .post(format!("{}/shu/distributions", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({
            "member_id": member.member_id,
            "year": 2025,
            "amount": "100.01"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(as_decimal(&body["share_10"]), dec!(10.00));
    assert_eq!(as_decimal(&body["share_30"]), dec!(30.00));
    assert_eq!(as_decimal(&body["share_60"]), dec!(60.01));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn topup_moves_shu_into_saldo() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let (member, _) = app.anggota("A-404").await;
    app.set_balances(member.member_id, dec!(2000), dec!(0), dec!(5000))
        .await;

    let response = app
        .client
        .post(format!("{}/shu/topup", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({ "member_id": member.member_id, "nominal": "3000" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let member = app.get_member(member.member_id).await;
    assert_eq!(member.shu, dec!(2000));
    assert_eq!(member.saldo, dec!(5000));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn topup_beyond_accrued_shu_is_rejected() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let (member, _) = app.anggota("A-405").await;
    app.set_balances(member.member_id, dec!(2000), dec!(0), dec!(5000))
        .await;

    let response = app
        .client
        .post(format!("{}/shu/topup", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({ "member_id": member.member_id, "nominal": "6000" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 400);

    // Both balances unchanged.
    let member = app.get_member(member.member_id).await;
    assert_eq!(member.shu, dec!(5000));
    assert_eq!(member.saldo, dec!(2000));

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn anggota_sees_only_own_distributions() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let (member_a, token_a) = app.anggota("A-406").await;
    let (member_b, _) = app.anggota("A-407").await;

    for (member_id, amount) in [(member_a.member_id, "10000"), (member_b.member_id, "20000")] {
        let response = app
            .client
            .post(format!("{}/shu/distributions", app.address))
            .bearer_auth(&admin_token)
            .json(&json!({ "member_id": member_id, "year": 2025, "amount": amount }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), 201);
    }

    let response = app
        .client
        .get(format!("{}/shu/distributions", app.address))
        .bearer_auth(&token_a)
        .send()
        .await
        .expect("Failed to execute request");
    let list: Vec<serde_json::Value> = response.json().await.expect("Invalid JSON");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["member_id"], member_a.member_id.to_string());

    app.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn fractional_cent_amount_is_unprocessable() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let (member, _) = app.anggota("A-406").await;

    let response = app
        .client
        .post(format!("{}/shu/distributions", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({
            "member_id": member.member_id,
            "year": 2025,
            "amount": "100.005"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 422);

    assert_eq!(app.get_member(member.member_id).await.shu, dec!(0));

    app.cleanup().await;
}
