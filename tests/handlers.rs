//! API-surface tests for the dashboard CRUD endpoints and the gateway
//! passthroughs, driven through the full router.

#[path = "common/mod.rs"]
mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

fn app_with_state() -> (axum::Router, AppState, std::sync::Arc<FakeGateway>) {
    let gateway = FakeGateway::new();
    let state = test_state(gateway.clone());
    (test_app(state.clone()), state, gateway)
}

// ============ Products ============

#[tokio::test]
async fn product_crud_flow() {
    let (app, _state, _) = app_with_state();

    let (status, created) = post_json(
        &app,
        "/api/products",
        json!({ "name": "Curso de Fotografia", "price": 149.9 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Curso de Fotografia");
    assert_eq!(created["currency"], "BRL");
    assert_eq!(created["active"], true);
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = get(&app, &format!("/api/products/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["price"], 149.9);

    let (status, updated) = put_json(
        &app,
        &format!("/api/products/{}", id),
        json!({ "price": 99.9, "active": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 99.9);
    assert_eq!(updated["active"], false);
    assert_eq!(updated["name"], "Curso de Fotografia");

    let (status, listed) = get(&app, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = delete(&app, &format!("/api/products/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &format!("/api/products/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_validation_rejected() {
    let (app, _state, _) = app_with_state();

    let (status, _) = post_json(&app, "/api/products", json!({ "name": "", "price": 10.0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        post_json(&app, "/api/products", json!({ "name": "X", "price": -1.0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============ Checkouts ============

#[tokio::test]
async fn checkout_requires_existing_product() {
    let (app, _state, _) = app_with_state();

    let (status, _) = post_json(
        &app,
        "/api/checkouts",
        json!({ "product_id": 12345, "title": "Curso", "slug": "curso" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checkout_slug_conflict_returns_409() {
    let (app, state, _) = app_with_state();

    let product_id = {
        let conn = state.db.get().unwrap();
        create_test_product(&conn, "Curso", 100.0).id
    };

    let body = json!({ "product_id": product_id, "title": "Curso", "slug": "curso" });
    let (status, _) = post_json(&app, "/api/checkouts", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, conflict) = post_json(&app, "/api/checkouts", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["error"], "Conflict");
}

// ============ Customers ============

#[tokio::test]
async fn customer_crud_and_validation() {
    let (app, _state, _) = app_with_state();

    let (status, _) = post_json(
        &app,
        "/api/customers",
        json!({ "name": "Ana", "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = post_json(
        &app,
        "/api/customers",
        json!({ "name": "Ana Lima", "email": "Ana@X.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // Normalized on the way in.
    assert_eq!(created["email"], "ana@x.com");

    let (status, _) = post_json(
        &app,
        "/api/customers",
        json!({ "name": "Outra", "email": "ana@x.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ============ Webhook subscriptions and deliveries ============

#[tokio::test]
async fn webhook_subscription_endpoints() {
    let (app, _state, _) = app_with_state();

    let (status, _) = post_json(&app, "/api/webhooks", json!({ "event": "", "url": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = post_json(
        &app,
        "/api/webhooks",
        json!({ "event": "payment", "url": "https://example.com/hook" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["active"], true);
    let id = created["id"].as_i64().unwrap();

    let (status, toggled) = put_json(
        &app,
        &format!("/api/webhooks/{}", id),
        json!({ "active": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["active"], false);

    let (status, deliveries) = get(&app, "/api/webhooks/deliveries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deliveries["total"], 0);
    assert_eq!(deliveries["items"].as_array().unwrap().len(), 0);

    let (status, _) = delete(&app, &format!("/api/webhooks/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ============ Transactions and activity ============

#[tokio::test]
async fn transactions_and_activity_listing() {
    let (app, state, gateway) = app_with_state();

    gateway.insert_payment(json!({ "id": 10, "status": "approved", "transaction_amount": 5.0 }));
    gateway.insert_payment(json!({ "id": 11, "status": "pending", "transaction_amount": 6.0 }));
    post_json(&app, "/api/mercadopago/webhook?topic=payment&id=10", json!({})).await;
    post_json(&app, "/api/mercadopago/webhook?topic=payment&id=11", json!({})).await;

    let (status, page) = get(&app, "/api/transactions?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["reference"], "11");

    let (status, feed) = get(&app, "/api/activity").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["total"], 2);
    assert_eq!(feed["items"][0]["kind"], "payment");

    // Detail endpoint by internal id.
    let internal_id = {
        let conn = state.db.get().unwrap();
        queries::get_transaction_by_reference(&conn, "10")
            .unwrap()
            .unwrap()
            .id
    };
    let (status, tx) = get(&app, &format!("/api/transactions/{}", internal_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tx["reference"], "10");
}

// ============ Gateway passthroughs ============

#[tokio::test]
async fn direct_payment_creates_local_records() {
    let (app, state, _) = app_with_state();

    let (status, payment) = post_json(
        &app,
        "/api/mercadopago/payment",
        json!({
            "id": 777,
            "status": "approved",
            "transaction_amount": 20.0,
            "payment_method_id": "pix",
            "payer": { "first_name": "Ana", "last_name": "Lima", "email": "ana@x.com" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["id"], 777);

    let conn = state.db.get().unwrap();
    let tx = queries::get_transaction_by_reference(&conn, "777")
        .unwrap()
        .expect("local transaction should exist");
    assert_eq!(tx.customer_name, "Ana Lima");
    assert_eq!(tx.amount, 20.0);
    assert_eq!(count_rows(&conn, "activity_log"), 1);
}

#[tokio::test]
async fn payment_status_lookup_by_reference() {
    let (app, _state, gateway) = app_with_state();

    let (status, _) = get(&app, "/api/mercadopago/payment/640").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    gateway.insert_payment(json!({ "id": 640, "status": "approved" }));
    post_json(&app, "/api/mercadopago/webhook?topic=payment&id=640", json!({})).await;

    let (status, tx) = get(&app, "/api/mercadopago/payment/640").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tx["reference"], "640");
    assert_eq!(tx["status"], "approved");
}

#[tokio::test]
async fn preference_endpoint_returns_redirect_url() {
    let (app, _state, _) = app_with_state();

    let (status, preference) = post_json(
        &app,
        "/api/mercadopago/preference",
        json!({
            "items": [{ "title": "Curso", "quantity": 1, "unit_price": 149.9 }],
            "notification_url": "http://localhost:3000/api/mercadopago/webhook"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(preference["init_point"], "https://gateway.test/init/pref-test-1");
}

#[tokio::test]
async fn gateway_error_maps_to_502_on_direct_endpoints() {
    let (app, _state, gateway) = app_with_state();
    gateway.fail_all("token rejected");

    let (status, body) = post_json(
        &app,
        "/api/mercadopago/preference",
        json!({ "items": [] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Payment gateway error");
}
