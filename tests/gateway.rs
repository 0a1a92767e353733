//! MercadoPago client tests against a local mock server.

use caixa::gateway::{
    GatewayError, MercadoPagoClient, PaymentGateway, PreferenceItem, PreferenceRequest,
};
use mockito::Matcher;
use serde_json::json;

fn client(server: &mockito::ServerGuard) -> MercadoPagoClient {
    MercadoPagoClient::new("test-token").with_base_url(server.url())
}

#[tokio::test]
async fn get_payment_fetches_and_decodes() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/payments/123")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 123,
                "status": "approved",
                "transaction_amount": 10.5,
                "currency_id": "BRL",
                "installments": 3
            })
            .to_string(),
        )
        .create_async()
        .await;

    let payment = client(&server).get_payment("123").await.unwrap();
    assert_eq!(payment.id, 123);
    assert_eq!(payment.status.as_deref(), Some("approved"));
    assert_eq!(payment.transaction_amount, Some(10.5));
    // Unmapped fields survive in the flattened remainder.
    assert_eq!(payment.extra["installments"], 3);

    mock.assert_async().await;
}

#[tokio::test]
async fn unknown_payment_becomes_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/payments/999")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "Payment not found", "status": 404 }).to_string())
        .create_async()
        .await;

    let err = client(&server).get_payment("999").await.unwrap_err();
    match err {
        GatewayError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Payment not found");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_raw_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/payments/1")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let err = client(&server).get_payment("1").await.unwrap_err();
    match err {
        GatewayError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn create_payment_forwards_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/payments")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(json!({
            "transaction_amount": 49.9,
            "payment_method_id": "pix"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "id": 555, "status": "pending", "transaction_amount": 49.9 }).to_string(),
        )
        .create_async()
        .await;

    let payment = client(&server)
        .create_payment(json!({
            "transaction_amount": 49.9,
            "payment_method_id": "pix",
            "payer": { "email": "ana@x.com" }
        }))
        .await
        .unwrap();

    assert_eq!(payment.id, 555);
    assert_eq!(payment.status.as_deref(), Some("pending"));

    mock.assert_async().await;
}

#[tokio::test]
async fn create_preference_returns_init_point() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/checkout/preferences")
        .match_body(Matcher::PartialJson(json!({
            "items": [{ "title": "Curso", "quantity": 1, "unit_price": 149.9 }],
            "notification_url": "https://shop.example/api/mercadopago/webhook"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "pref-1",
                "init_point": "https://mp.test/init/pref-1"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let request = PreferenceRequest {
        items: vec![PreferenceItem {
            title: "Curso".to_string(),
            quantity: 1,
            unit_price: 149.9,
            currency_id: None,
        }],
        back_urls: None,
        notification_url: Some("https://shop.example/api/mercadopago/webhook".to_string()),
    };

    let preference = client(&server).create_preference(&request).await.unwrap();
    assert_eq!(preference.id, "pref-1");
    assert_eq!(preference.init_point, "https://mp.test/init/pref-1");

    mock.assert_async().await;
}
