use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::{queries, AppState};
use crate::error::{AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::models::{Checkout, CreateCheckout, UpdateCheckout};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/checkouts", get(list_checkouts))
        .route("/api/checkouts", post(create_checkout))
        .route("/api/checkouts/{id}", get(get_checkout))
        .route("/api/checkouts/{id}", put(update_checkout))
        .route("/api/checkouts/{id}", delete(delete_checkout))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    Json(input): Json<CreateCheckout>,
) -> Result<(StatusCode, Json<Checkout>)> {
    if input.slug.trim().is_empty() {
        return Err(AppError::BadRequest("Checkout slug is required".into()));
    }

    let conn = state.db.get()?;
    // The link must point at something that exists.
    queries::get_product(&conn, input.product_id)?.or_not_found("Product not found")?;

    let checkout = queries::create_checkout(&conn, &input)?;
    Ok((StatusCode::CREATED, Json(checkout)))
}

pub async fn list_checkouts(State(state): State<AppState>) -> Result<Json<Vec<Checkout>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_checkouts(&conn)?))
}

pub async fn get_checkout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Checkout>> {
    let conn = state.db.get()?;
    let checkout = queries::get_checkout(&conn, id)?.or_not_found("Checkout not found")?;
    Ok(Json(checkout))
}

pub async fn update_checkout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCheckout>,
) -> Result<Json<Checkout>> {
    let conn = state.db.get()?;
    let checkout = queries::update_checkout(&conn, id, &input)?.or_not_found("Checkout not found")?;
    Ok(Json(checkout))
}

pub async fn delete_checkout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let conn = state.db.get()?;
    if !queries::delete_checkout(&conn, id)? {
        return Err(AppError::NotFound("Checkout not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
