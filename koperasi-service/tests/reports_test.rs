//! Admin reporting over settled sales.
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
async fn summary_counts_only_settled_sales() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let (_kasir, kasir_token) = app.kasir().await;
    let (_member, anggota_token) = app.anggota("A-501").await;
    let item = app.seed_item("Air mineral", 100, dec!(2000), dec!(3000)).await;

    // One settled cashier sale.
    let response = app
        .client
        .post(format!("{}/sales", app.address))
        .bearer_auth(&kasir_token)
        .json(&json!({
            "lines": [{ "item_id": item.item_id, "quantity": 4 }],
            "payment_method": "cash"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);

    // One self-checkout that stays pending.
    let response = app
        .client
        .post(format!("{}/sales", app.address))
        .bearer_auth(&anggota_token)
        .json(&json!({
            "lines": [{ "item_id": item.item_id, "quantity": 2 }],
            "payment_method": "cash"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);

    let response = app
        .client
        .get(format!("{}/reports/summary", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["transaction_count"], 1);
    assert_eq!(as_decimal(&body["total_revenue"]), dec!(12000));
    assert_eq!(as_decimal(&body["total_profit"]), dec!(4000));

    // Summary is admin only.
    let response = app
        .client
        .get(format!("{}/reports/summary", app.address))
        .bearer_auth(&kasir_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 403);

    app.cleanup().await;
}
