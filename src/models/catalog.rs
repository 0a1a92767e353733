//! Catalog entities backing the dashboard CRUD screens: products, checkout
//! links, and customers. Plain data plumbing; the reconciliation flow only
//! touches these through the optional `Transaction::checkout_id` link.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub active: Option<bool>,
}

/// A shareable checkout link for a product. The slug is what goes in the
/// URL handed to buyers; the gateway's `external_reference` carries the
/// checkout id back to us on notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkout {
    pub id: i64,
    pub product_id: i64,
    pub title: String,
    pub slug: String,
    pub redirect_url: Option<String>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckout {
    pub product_id: i64,
    pub title: String,
    pub slug: String,
    pub redirect_url: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateCheckout {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub redirect_url: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_true() -> bool {
    true
}
