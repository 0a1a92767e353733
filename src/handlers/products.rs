use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::{queries, AppState};
use crate::error::{AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::models::{CreateProduct, Product, UpdateProduct};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products", post(create_product))
        .route("/api/products/{id}", get(get_product))
        .route("/api/products/{id}", put(update_product))
        .route("/api/products/{id}", delete(delete_product))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".into()));
    }
    if input.price < 0.0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }

    let conn = state.db.get()?;
    let product = queries::create_product(&conn, &input)?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_products(&conn)?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>> {
    let conn = state.db.get()?;
    let product = queries::get_product(&conn, id)?.or_not_found("Product not found")?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProduct>,
) -> Result<Json<Product>> {
    if let Some(price) = input.price {
        if price < 0.0 {
            return Err(AppError::BadRequest("Price cannot be negative".into()));
        }
    }

    let conn = state.db.get()?;
    let product = queries::update_product(&conn, id, &input)?.or_not_found("Product not found")?;
    Ok(Json(product))
}

pub async fn delete_product(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    let conn = state.db.get()?;
    if !queries::delete_product(&conn, id)? {
        return Err(AppError::NotFound("Product not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
