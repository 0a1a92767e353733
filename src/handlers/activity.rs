use axum::{extract::State, routing::get, Router};

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::models::ActivityEntry;
use crate::pagination::{Paginated, PaginationQuery};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/activity", get(list_activity))
}

/// GET /api/activity
/// The dashboard feed, most-recent-first.
pub async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<ActivityEntry>>> {
    let conn = state.db.get()?;
    let limit = query.limit();
    let offset = query.offset();
    let (items, total) = queries::list_activity_paginated(&conn, limit, offset)?;
    Ok(Json(Paginated::new(items, total, limit, offset)))
}
