use serde::{Deserialize, Serialize};

/// A local payment record derived from the gateway's canonical payment
/// object. `reference` is the gateway-assigned payment id and uniquely
/// identifies the real-world payment; repeated notifications for the same
/// payment update this row instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// Gateway payment id (string form). Unique.
    pub reference: String,
    /// Checkout link that originated the payment, when the gateway's
    /// `external_reference` correlates one. Orphan payments stay unlinked.
    pub checkout_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    pub amount: f64,
    pub currency: String,
    /// Mirrors the gateway's status vocabulary ("pending", "approved", ...).
    /// Deliberately not a local enum: the gateway owns this vocabulary.
    pub status: String,
    /// Gateway payment method id ("pix", "credit_card", ...).
    pub method: String,
    /// Full raw gateway payload, retained for forensic replay.
    pub metadata: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Data required to upsert a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub reference: String,
    pub checkout_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub method: String,
    pub metadata: Option<serde_json::Value>,
}
