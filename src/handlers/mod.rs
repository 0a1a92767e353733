pub mod activity;
pub mod checkouts;
pub mod customers;
pub mod mercadopago;
pub mod products;
pub mod transactions;
pub mod webhooks;

use axum::Router;

use crate::db::AppState;

/// Full API surface: the gateway endpoints (including the notification
/// receiver) plus the dashboard CRUD routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(mercadopago::router())
        .merge(products::router())
        .merge(checkouts::router())
        .merge(customers::router())
        .merge(transactions::router())
        .merge(activity::router())
        .merge(webhooks::router())
}
