use axum::{extract::State, routing::get, Router};

use crate::db::{queries, AppState};
use crate::error::{OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::models::Transaction;
use crate::pagination::{Paginated, PaginationQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/transactions", get(list_transactions))
        .route("/api/transactions/{id}", get(get_transaction))
}

/// GET /api/transactions
/// Most-recent-first, paginated, for the dashboard table.
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Transaction>>> {
    let conn = state.db.get()?;
    let limit = query.limit();
    let offset = query.offset();
    let (items, total) = queries::list_transactions_paginated(&conn, limit, offset)?;
    Ok(Json(Paginated::new(items, total, limit, offset)))
}

/// GET /api/transactions/{id}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>> {
    let conn = state.db.get()?;
    let transaction = queries::get_transaction(&conn, id)?.or_not_found("Transaction not found")?;
    Ok(Json(transaction))
}
