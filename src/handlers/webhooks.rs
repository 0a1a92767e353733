//! Webhook configuration and delivery history.
//!
//! Subscriptions are operator-edited configuration with a meaningful `active`
//! toggle. Deliveries are the reconciler's append-only processing log and are
//! read-only here; the two are deliberately separate entities.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::{queries, AppState};
use crate::error::{AppError, OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::models::{CreateWebhookSubscription, UpdateWebhookSubscription, WebhookDelivery, WebhookSubscription};
use crate::pagination::{Paginated, PaginationQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/webhooks", get(list_subscriptions))
        .route("/api/webhooks", post(create_subscription))
        .route("/api/webhooks/deliveries", get(list_deliveries))
        .route("/api/webhooks/{id}", get(get_subscription))
        .route("/api/webhooks/{id}", put(update_subscription))
        .route("/api/webhooks/{id}", delete(delete_subscription))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    Json(input): Json<CreateWebhookSubscription>,
) -> Result<(StatusCode, Json<WebhookSubscription>)> {
    if input.event.trim().is_empty() {
        return Err(AppError::BadRequest("Webhook event is required".into()));
    }
    if input.url.trim().is_empty() {
        return Err(AppError::BadRequest("Webhook URL is required".into()));
    }

    let conn = state.db.get()?;
    let subscription = queries::create_webhook_subscription(&conn, &input)?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<WebhookSubscription>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_webhook_subscriptions(&conn)?))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WebhookSubscription>> {
    let conn = state.db.get()?;
    let subscription =
        queries::get_webhook_subscription(&conn, id)?.or_not_found("Webhook not found")?;
    Ok(Json(subscription))
}

pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateWebhookSubscription>,
) -> Result<Json<WebhookSubscription>> {
    let conn = state.db.get()?;
    let subscription =
        queries::update_webhook_subscription(&conn, id, &input)?.or_not_found("Webhook not found")?;
    Ok(Json(subscription))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let conn = state.db.get()?;
    if !queries::delete_webhook_subscription(&conn, id)? {
        return Err(AppError::NotFound("Webhook not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/webhooks/deliveries
/// The notification-processing log, most-recent-first.
pub async fn list_deliveries(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<WebhookDelivery>>> {
    let conn = state.db.get()?;
    let limit = query.limit();
    let offset = query.offset();
    let (items, total) = queries::list_webhook_deliveries_paginated(&conn, limit, offset)?;
    Ok(Json(Paginated::new(items, total, limit, offset)))
}
