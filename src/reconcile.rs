//! Webhook-driven payment-state reconciliation.
//!
//! The gateway delivers notifications at-least-once, possibly duplicated and
//! out of order, carrying only a topic and an id. Reconciliation re-fetches
//! the authoritative payment state, mirrors it into the local transaction
//! store (upsert keyed on the gateway reference, so duplicates collapse), and
//! logs every processing attempt. Once a notification has valid parameters it
//! is always acknowledged with 200, since internal failures must not look
//! like a broken endpoint to the gateway's retry scheduler.

use serde_json::{json, Value};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::gateway::GatewayPayment;
use crate::models::{ActivityKind, NewTransaction, WebhookDelivery};

pub const TOPIC_PAYMENT: &str = "payment";
pub const TOPIC_MERCHANT_ORDER: &str = "merchant_order";

/// Derive a local transaction from the gateway's canonical payment object.
///
/// Pure mapping with fixed defaults for anything the gateway omits. The only
/// required field is the payment id itself, which becomes the reference.
pub fn derive_transaction(payment: &GatewayPayment) -> Result<NewTransaction> {
    let payer = payment.payer.as_ref();

    let customer_name = payer
        .and_then(|p| match (&p.first_name, &p.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        })
        .unwrap_or_else(|| "Cliente".to_string());

    let customer_email = payer
        .and_then(|p| p.email.clone())
        .unwrap_or_else(|| "email@exemplo.com".to_string());

    // A non-numeric or absent external_reference means the payment has no
    // correlating checkout; it is stored unlinked rather than attributed to
    // some default checkout.
    let checkout_id = payment
        .external_reference
        .as_deref()
        .and_then(|r| r.parse::<i64>().ok());

    Ok(NewTransaction {
        reference: payment.id.to_string(),
        checkout_id,
        customer_name,
        customer_email,
        amount: payment.transaction_amount.unwrap_or(0.0),
        currency: payment
            .currency_id
            .clone()
            .unwrap_or_else(|| "BRL".to_string()),
        status: payment
            .status
            .clone()
            .unwrap_or_else(|| "pending".to_string()),
        method: payment
            .payment_method_id
            .clone()
            .unwrap_or_else(|| "mercadopago".to_string()),
        metadata: Some(serde_json::to_value(payment)?),
    })
}

/// Handle one notification with valid parameters. Returns the topic-dependent
/// data object for the acknowledgment envelope; any `Err` is an internal
/// failure the caller records best-effort and still acknowledges.
pub async fn process_notification(
    state: &AppState,
    topic: &str,
    id: &str,
    url: &str,
) -> Result<Value> {
    match topic {
        TOPIC_PAYMENT => reconcile_payment(state, id, url).await,
        // Acknowledged but unprocessed: merchant orders carry no payment
        // state of their own.
        TOPIC_MERCHANT_ORDER => {
            let data = json!({ "status": "received", "id": id });
            let conn = state.db.get()?;
            queries::append_webhook_delivery(&conn, topic, url, true, &data)?;
            Ok(data)
        }
        other => {
            let data = json!({ "status": "unhandled", "topic": other, "id": id });
            let conn = state.db.get()?;
            queries::append_webhook_delivery(&conn, other, url, true, &data)?;
            Ok(data)
        }
    }
}

async fn reconcile_payment(state: &AppState, id: &str, url: &str) -> Result<Value> {
    // The notification body is never trusted: always re-fetch the current
    // payment state from the gateway.
    let payment = state.gateway.get_payment(id).await?;
    let draft = derive_transaction(&payment)?;
    let data = serde_json::to_value(&payment)?;

    let conn = state.db.get()?;
    let stored = queries::upsert_transaction_by_reference(&conn, &draft)?;

    queries::append_activity(
        &conn,
        ActivityKind::Payment,
        &format!(
            "Payment {} {} ({} {})",
            stored.reference, stored.status, stored.amount, stored.currency
        ),
        Some(&json!({
            "transaction_id": stored.id,
            "reference": stored.reference,
            "status": stored.status,
            "amount": stored.amount,
        })),
    )?;

    queries::append_webhook_delivery(&conn, TOPIC_PAYMENT, url, true, &data)?;

    tracing::info!(
        "payment notification reconciled: reference={}, status={}",
        stored.reference,
        stored.status
    );

    Ok(data)
}

/// Best-effort failure record for the delivery log. The caller acknowledges
/// the notification regardless; this write's own failure is returned as an
/// error value so it reaches the operational log instead of vanishing.
pub fn record_failure(
    state: &AppState,
    topic: &str,
    url: &str,
    error: &AppError,
) -> Result<WebhookDelivery> {
    let conn = state.db.get()?;
    queries::append_webhook_delivery(
        &conn,
        topic,
        url,
        false,
        &json!({ "error": error.to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payment(value: Value) -> GatewayPayment {
        serde_json::from_value(value).expect("test payment should deserialize")
    }

    #[test]
    fn maps_payer_and_amounts() {
        let payment = payment(json!({
            "id": 999,
            "status": "approved",
            "transaction_amount": 150.0,
            "payer": {
                "first_name": "Ana",
                "last_name": "Lima",
                "email": "ana@x.com"
            }
        }));

        let tx = derive_transaction(&payment).unwrap();
        assert_eq!(tx.reference, "999");
        assert_eq!(tx.customer_name, "Ana Lima");
        assert_eq!(tx.customer_email, "ana@x.com");
        assert_eq!(tx.amount, 150.0);
        assert_eq!(tx.status, "approved");
        // Absent from the payload, so defaulted.
        assert_eq!(tx.currency, "BRL");
        assert_eq!(tx.method, "mercadopago");
    }

    #[test]
    fn defaults_when_payer_missing() {
        let payment = payment(json!({ "id": 1 }));

        let tx = derive_transaction(&payment).unwrap();
        assert_eq!(tx.customer_name, "Cliente");
        assert_eq!(tx.customer_email, "email@exemplo.com");
        assert_eq!(tx.amount, 0.0);
        assert_eq!(tx.status, "pending");
    }

    #[test]
    fn partial_payer_name_falls_back() {
        let payment = payment(json!({
            "id": 2,
            "payer": { "first_name": "Ana", "email": "ana@x.com" }
        }));

        let tx = derive_transaction(&payment).unwrap();
        assert_eq!(tx.customer_name, "Cliente");
        assert_eq!(tx.customer_email, "ana@x.com");
    }

    #[test]
    fn external_reference_links_checkout() {
        let linked = payment(json!({ "id": 3, "external_reference": "42" }));
        assert_eq!(derive_transaction(&linked).unwrap().checkout_id, Some(42));

        let orphan = payment(json!({ "id": 4, "external_reference": "order-abc" }));
        assert_eq!(derive_transaction(&orphan).unwrap().checkout_id, None);

        let absent = payment(json!({ "id": 5 }));
        assert_eq!(derive_transaction(&absent).unwrap().checkout_id, None);
    }

    #[test]
    fn metadata_preserves_unmapped_fields() {
        let payment = payment(json!({
            "id": 6,
            "status": "approved",
            "installments": 3,
            "point_of_interaction": { "type": "checkout" }
        }));

        let tx = derive_transaction(&payment).unwrap();
        let metadata = tx.metadata.unwrap();
        assert_eq!(metadata["installments"], 3);
        assert_eq!(metadata["point_of_interaction"]["type"], "checkout");
        assert_eq!(metadata["id"], 6);
    }
}
