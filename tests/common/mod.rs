//! Test utilities and fixtures for Caixa integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

pub use caixa::db::{init_db, queries, AppState, DbPool};
pub use caixa::gateway::{
    GatewayError, GatewayPayment, GatewayPreference, PaymentGateway, PreferenceRequest,
};
pub use caixa::models::*;

/// In-memory pooled database with schema initialized.
pub fn setup_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(4).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

/// Bare in-memory connection for store-level tests.
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Programmable stand-in for the payment gateway. Payments are keyed by
/// their gateway id; `fail_all` makes every subsequent call fail.
#[derive(Default)]
pub struct FakeGateway {
    payments: Mutex<HashMap<String, Value>>,
    failure: Mutex<Option<String>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register (or replace) the payment object returned by `get_payment`.
    pub fn insert_payment(&self, payment: Value) {
        let id = payment["id"].to_string();
        self.payments.lock().unwrap().insert(id, payment);
    }

    /// Make every subsequent gateway call fail with this message.
    pub fn fail_all(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn check_failure(&self) -> Result<(), GatewayError> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(GatewayError::Api {
                status: 500,
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment(&self, body: Value) -> Result<GatewayPayment, GatewayError> {
        self.check_failure()?;
        serde_json::from_value(body).map_err(|e| GatewayError::Api {
            status: 400,
            message: e.to_string(),
        })
    }

    async fn get_payment(&self, id: &str) -> Result<GatewayPayment, GatewayError> {
        self.check_failure()?;
        let payments = self.payments.lock().unwrap();
        let raw = payments.get(id).ok_or_else(|| GatewayError::Api {
            status: 404,
            message: format!("Payment {} not found", id),
        })?;
        serde_json::from_value(raw.clone()).map_err(|e| GatewayError::Api {
            status: 500,
            message: e.to_string(),
        })
    }

    async fn create_preference(
        &self,
        _request: &PreferenceRequest,
    ) -> Result<GatewayPreference, GatewayError> {
        self.check_failure()?;
        Ok(serde_json::from_value(serde_json::json!({
            "id": "pref-test-1",
            "init_point": "https://gateway.test/init/pref-test-1"
        }))
        .expect("static preference should deserialize"))
    }
}

/// AppState wired to an in-memory database and the given fake gateway.
pub fn test_state(gateway: Arc<FakeGateway>) -> AppState {
    AppState {
        db: setup_test_pool(),
        gateway,
        base_url: "http://localhost:3000".to_string(),
    }
}

/// The full API router over the given state.
pub fn test_app(state: AppState) -> Router {
    caixa::handlers::router().with_state(state)
}

/// Fire a request with an optional JSON body and decode the JSON response.
/// Returns `Value::Null` for empty bodies (e.g. 204s).
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    request(app, "GET", uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    request(app, "POST", uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    request(app, "PUT", uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    request(app, "DELETE", uri, None).await
}

/// Count rows in a table, for asserting side effects (or their absence).
pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

/// Create a product directly in the store for fixtures.
pub fn create_test_product(conn: &Connection, name: &str, price: f64) -> Product {
    queries::create_product(
        conn,
        &CreateProduct {
            name: name.to_string(),
            description: None,
            price,
            currency: "BRL".to_string(),
            active: true,
        },
    )
    .expect("Failed to create test product")
}

/// Create a checkout link directly in the store for fixtures.
pub fn create_test_checkout(conn: &Connection, product_id: i64, slug: &str) -> Checkout {
    queries::create_checkout(
        conn,
        &CreateCheckout {
            product_id,
            title: format!("Checkout {}", slug),
            slug: slug.to_string(),
            redirect_url: None,
            active: true,
        },
    )
    .expect("Failed to create test checkout")
}
