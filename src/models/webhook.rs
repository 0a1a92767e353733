use serde::{Deserialize, Serialize};

/// Operator-configured webhook subscription shown and edited in the
/// dashboard. Configuration only: the delivery history lives in
/// [`WebhookDelivery`], a separate append-only entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub id: i64,
    /// Event category the subscription listens for (e.g. "payment").
    pub event: String,
    pub url: String,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWebhookSubscription {
    pub event: String,
    pub url: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateWebhookSubscription {
    pub event: Option<String>,
    pub url: Option<String>,
    pub active: Option<bool>,
}

/// One row per inbound-notification processing attempt, success or failure.
/// Never mutated or deleted; this is the reconciler's log, not current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: i64,
    /// Notification topic ("payment", "merchant_order", ...).
    pub event: String,
    /// Inbound request path, kept as a lightweight trace of which endpoint
    /// fired.
    pub url: String,
    pub succeeded: bool,
    /// Normalized gateway response on success, `{"error": message}` on
    /// failure.
    pub payload: serde_json::Value,
    pub processed_at: i64,
}
