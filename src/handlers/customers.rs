use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::{queries, AppState};
use crate::error::{AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::models::{CreateCustomer, Customer, UpdateCustomer};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers))
        .route("/api/customers", post(create_customer))
        .route("/api/customers/{id}", get(get_customer))
        .route("/api/customers/{id}", put(update_customer))
        .route("/api/customers/{id}", delete(delete_customer))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<Customer>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Customer name is required".into()));
    }
    if !input.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }

    let conn = state.db.get()?;
    let customer = queries::create_customer(&conn, &input)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_customers(&conn)?))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>> {
    let conn = state.db.get()?;
    let customer = queries::get_customer(&conn, id)?.or_not_found("Customer not found")?;
    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCustomer>,
) -> Result<Json<Customer>> {
    if let Some(email) = &input.email {
        if !email.contains('@') {
            return Err(AppError::BadRequest("Invalid email address".into()));
        }
    }

    let conn = state.db.get()?;
    let customer = queries::update_customer(&conn, id, &input)?.or_not_found("Customer not found")?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let conn = state.db.get()?;
    if !queries::delete_customer(&conn, id)? {
        return Err(AppError::NotFound("Customer not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
