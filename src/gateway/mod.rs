//! Payment gateway integration.
//!
//! The reconciliation flow never trusts notification bodies; everything it
//! stores is re-fetched from the gateway through this interface. The trait
//! exists so tests can substitute a fake without touching the network.

mod mercadopago;

pub use mercadopago::MercadoPagoClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with an error payload (unknown payment id,
    /// rejected request, etc.).
    #[error("gateway returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Payer data as the gateway reports it. All fields are best-effort; the
/// mapping into a local transaction applies defaults for whatever is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// The gateway's canonical payment object.
///
/// Only the fields the reconciler maps are typed; everything else the gateway
/// sent is kept in `extra`, so serializing this struct back reproduces the
/// full payload for the transaction's forensic metadata column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<GatewayPayer>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A redirect-checkout session. `init_point` is the URL the buyer is sent to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPreference {
    pub id: String,
    pub init_point: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_init_point: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<String>,
}

/// Request body for creating a redirect-checkout preference.
/// `notification_url` points the gateway's webhook deliveries back at us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_urls: Option<BackUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
}

/// Payment gateway operations used by the handlers and the reconciler.
///
/// All three calls are single request/response; none retries internally.
/// Callers own whatever retry policy they want.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit a direct payment request. The body is gateway-shaped and
    /// forwarded as-is.
    async fn create_payment(&self, body: Value) -> Result<GatewayPayment, GatewayError>;

    /// Fetch the current state of a payment by its gateway-assigned id.
    async fn get_payment(&self, id: &str) -> Result<GatewayPayment, GatewayError>;

    /// Create a redirect-checkout session.
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<GatewayPreference, GatewayError>;
}
