//! Gateway-facing endpoints: the notification receiver (the reconciliation
//! entry point) and the direct payment/preference passthroughs.

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{queries, AppState};
use crate::error::{OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::gateway::{GatewayPayment, GatewayPreference, PreferenceRequest};
use crate::models::{ActivityKind, Transaction};
use crate::reconcile;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/mercadopago/webhook", post(handle_notification))
        .route("/api/mercadopago/preference", post(create_preference))
        .route("/api/mercadopago/payment", post(create_payment))
        .route("/api/mercadopago/payment/{id}", get(get_payment_status))
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub topic: Option<String>,
    pub id: Option<String>,
}

/// Gateway notification receiver.
///
/// Missing parameters are the only 400; once both are present every path
/// terminates in a 200 acknowledgment, success or not, so that internal
/// failures never read as a broken endpoint to the gateway's retry scheduler.
/// Failures are visible in the delivery log instead.
pub async fn handle_notification(
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let (topic, id) = match (params.topic.as_deref(), params.id.as_deref()) {
        (Some(topic), Some(id)) if !topic.is_empty() && !id.is_empty() => (topic, id),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "message": "Parâmetros inválidos" })),
            )
                .into_response();
        }
    };

    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    match reconcile::process_notification(&state, topic, id, url).await {
        Ok(data) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "data": data })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("notification processing failed: topic={}, id={}: {}", topic, id, err);
            if let Err(log_err) = reconcile::record_failure(&state, topic, url, &err) {
                tracing::error!("failed to record notification failure: {}", log_err);
            }
            (
                StatusCode::OK,
                axum::Json(json!({ "success": false, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// Create a redirect-checkout session; the response's `init_point` is the
/// URL the storefront opens for the buyer.
pub async fn create_preference(
    State(state): State<AppState>,
    Json(request): Json<PreferenceRequest>,
) -> Result<(StatusCode, Json<GatewayPreference>)> {
    let preference = state.gateway.create_preference(&request).await?;
    Ok((StatusCode::CREATED, Json(preference)))
}

/// Submit a direct payment to the gateway, mirroring the result into the
/// local transaction store and the activity feed.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<GatewayPayment>)> {
    let payment = state.gateway.create_payment(body).await?;

    let draft = reconcile::derive_transaction(&payment)?;
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

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Local payment-status lookup by gateway reference.
pub async fn get_payment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>> {
    let conn = state.db.get()?;
    let transaction =
        queries::get_transaction_by_reference(&conn, &id)?.or_not_found("Transaction not found")?;
    Ok(Json(transaction))
}
