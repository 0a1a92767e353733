use chrono::Utc;
use rusqlite::{params, types::Value, Connection, ErrorCode, OptionalExtension};

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    query_all, query_one, FromRow, ACTIVITY_COLS, CHECKOUT_COLS, CUSTOMER_COLS, DELIVERY_COLS,
    PRODUCT_COLS, SUBSCRIPTION_COLS, TRANSACTION_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn json_text(value: Option<&serde_json::Value>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Remap UNIQUE-constraint failures to a 409 with a domain message, leaving
/// every other database error untouched.
fn map_unique(err: AppError, conflict_msg: &str) -> AppError {
    match &err {
        AppError::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            AppError::Conflict(conflict_msg.to_string())
        }
        _ => err,
    }
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id: i64,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: i64) -> Self {
        Self {
            table,
            id,
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Execute the update and return the updated entity via RETURNING.
    /// Returns None if no row matched or there was nothing to update.
    fn execute_returning<T: FromRow>(
        mut self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Products ============

pub fn create_product(conn: &Connection, input: &CreateProduct) -> Result<Product> {
    let now = now();
    conn.query_row(
        &format!(
            "INSERT INTO products (name, description, price, currency, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) RETURNING {}",
            PRODUCT_COLS
        ),
        params![
            &input.name,
            &input.description,
            input.price,
            &input.currency,
            input.active,
            now
        ],
        Product::from_row,
    )
    .map_err(Into::into)
}

pub fn get_product(conn: &Connection, id: i64) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        &[&id],
    )
}

pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    query_all(
        conn,
        &format!("SELECT {} FROM products ORDER BY created_at DESC, id DESC", PRODUCT_COLS),
        &[],
    )
}

pub fn update_product(conn: &Connection, id: i64, input: &UpdateProduct) -> Result<Option<Product>> {
    UpdateBuilder::new("products", id)
        .set_opt("name", input.name.clone())
        .set_opt("description", input.description.clone())
        .set_opt("price", input.price)
        .set_opt("currency", input.currency.clone())
        .set_opt("active", input.active)
        .execute_returning(conn, PRODUCT_COLS)
}

pub fn delete_product(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Checkouts ============

pub fn create_checkout(conn: &Connection, input: &CreateCheckout) -> Result<Checkout> {
    let now = now();
    conn.query_row(
        &format!(
            "INSERT INTO checkouts (product_id, title, slug, redirect_url, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) RETURNING {}",
            CHECKOUT_COLS
        ),
        params![
            input.product_id,
            &input.title,
            &input.slug,
            &input.redirect_url,
            input.active,
            now
        ],
        Checkout::from_row,
    )
    .map_err(AppError::from)
    .map_err(|e| map_unique(e, "A checkout with this slug already exists"))
}

pub fn get_checkout(conn: &Connection, id: i64) -> Result<Option<Checkout>> {
    query_one(
        conn,
        &format!("SELECT {} FROM checkouts WHERE id = ?1", CHECKOUT_COLS),
        &[&id],
    )
}

pub fn list_checkouts(conn: &Connection) -> Result<Vec<Checkout>> {
    query_all(
        conn,
        &format!("SELECT {} FROM checkouts ORDER BY created_at DESC, id DESC", CHECKOUT_COLS),
        &[],
    )
}

pub fn update_checkout(conn: &Connection, id: i64, input: &UpdateCheckout) -> Result<Option<Checkout>> {
    UpdateBuilder::new("checkouts", id)
        .set_opt("title", input.title.clone())
        .set_opt("slug", input.slug.clone())
        .set_opt("redirect_url", input.redirect_url.clone())
        .set_opt("active", input.active)
        .execute_returning(conn, CHECKOUT_COLS)
        .map_err(|e| map_unique(e, "A checkout with this slug already exists"))
}

pub fn delete_checkout(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM checkouts WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Customers ============

pub fn create_customer(conn: &Connection, input: &CreateCustomer) -> Result<Customer> {
    let now = now();
    let email = input.email.trim().to_lowercase();
    conn.query_row(
        &format!(
            "INSERT INTO customers (name, email, phone, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4) RETURNING {}",
            CUSTOMER_COLS
        ),
        params![&input.name, &email, &input.phone, now],
        Customer::from_row,
    )
    .map_err(AppError::from)
    .map_err(|e| map_unique(e, "A customer with this email already exists"))
}

pub fn get_customer(conn: &Connection, id: i64) -> Result<Option<Customer>> {
    query_one(
        conn,
        &format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLS),
        &[&id],
    )
}

pub fn list_customers(conn: &Connection) -> Result<Vec<Customer>> {
    query_all(
        conn,
        &format!("SELECT {} FROM customers ORDER BY created_at DESC, id DESC", CUSTOMER_COLS),
        &[],
    )
}

pub fn update_customer(conn: &Connection, id: i64, input: &UpdateCustomer) -> Result<Option<Customer>> {
    UpdateBuilder::new("customers", id)
        .set_opt("name", input.name.clone())
        .set_opt("email", input.email.as_ref().map(|e| e.trim().to_lowercase()))
        .set_opt("phone", input.phone.clone())
        .execute_returning(conn, CUSTOMER_COLS)
        .map_err(|e| map_unique(e, "A customer with this email already exists"))
}

pub fn delete_customer(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM customers WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Transactions ============

/// Insert a transaction, or refresh the existing row for the same gateway
/// reference. At-least-once notification delivery therefore collapses into
/// exactly one row per real-world payment, carrying the gateway's latest
/// status.
pub fn upsert_transaction_by_reference(
    conn: &Connection,
    input: &NewTransaction,
) -> Result<Transaction> {
    let now = now();
    conn.query_row(
        &format!(
            "INSERT INTO transactions (reference, checkout_id, customer_name, customer_email,
                                       amount, currency, status, method, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
             ON CONFLICT(reference) DO UPDATE SET
                 status = excluded.status,
                 amount = excluded.amount,
                 currency = excluded.currency,
                 method = excluded.method,
                 metadata = excluded.metadata,
                 updated_at = excluded.updated_at
             RETURNING {}",
            TRANSACTION_COLS
        ),
        params![
            &input.reference,
            input.checkout_id,
            &input.customer_name,
            &input.customer_email,
            input.amount,
            &input.currency,
            &input.status,
            &input.method,
            json_text(input.metadata.as_ref()),
            now
        ],
        Transaction::from_row,
    )
    .map_err(Into::into)
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLS),
        &[&id],
    )
}

pub fn get_transaction_by_reference(
    conn: &Connection,
    reference: &str,
) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE reference = ?1",
            TRANSACTION_COLS
        ),
        &[&reference],
    )
}

/// Most-recent-first page of transactions plus the total row count.
pub fn list_transactions_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Transaction>, i64)> {
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM transactions ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            TRANSACTION_COLS
        ),
        &[&limit, &offset],
    )?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))?;
    Ok((items, total))
}

// ============ Webhook subscriptions ============

pub fn create_webhook_subscription(
    conn: &Connection,
    input: &CreateWebhookSubscription,
) -> Result<WebhookSubscription> {
    let now = now();
    conn.query_row(
        &format!(
            "INSERT INTO webhook_subscriptions (event, url, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4) RETURNING {}",
            SUBSCRIPTION_COLS
        ),
        params![&input.event, &input.url, input.active, now],
        WebhookSubscription::from_row,
    )
    .map_err(Into::into)
}

pub fn get_webhook_subscription(conn: &Connection, id: i64) -> Result<Option<WebhookSubscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM webhook_subscriptions WHERE id = ?1",
            SUBSCRIPTION_COLS
        ),
        &[&id],
    )
}

pub fn list_webhook_subscriptions(conn: &Connection) -> Result<Vec<WebhookSubscription>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM webhook_subscriptions ORDER BY created_at DESC, id DESC",
            SUBSCRIPTION_COLS
        ),
        &[],
    )
}

pub fn update_webhook_subscription(
    conn: &Connection,
    id: i64,
    input: &UpdateWebhookSubscription,
) -> Result<Option<WebhookSubscription>> {
    UpdateBuilder::new("webhook_subscriptions", id)
        .set_opt("event", input.event.clone())
        .set_opt("url", input.url.clone())
        .set_opt("active", input.active)
        .execute_returning(conn, SUBSCRIPTION_COLS)
}

pub fn delete_webhook_subscription(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM webhook_subscriptions WHERE id = ?1",
        params![id],
    )?;
    Ok(affected > 0)
}

// ============ Webhook deliveries ============

/// Append one delivery-log row. Called on every notification-processing
/// attempt, success and failure alike; rows are never mutated afterwards.
pub fn append_webhook_delivery(
    conn: &Connection,
    event: &str,
    url: &str,
    succeeded: bool,
    payload: &serde_json::Value,
) -> Result<WebhookDelivery> {
    conn.query_row(
        &format!(
            "INSERT INTO webhook_deliveries (event, url, succeeded, payload, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {}",
            DELIVERY_COLS
        ),
        params![event, url, succeeded, payload.to_string(), now()],
        WebhookDelivery::from_row,
    )
    .map_err(Into::into)
}

pub fn list_webhook_deliveries_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<WebhookDelivery>, i64)> {
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM webhook_deliveries ORDER BY processed_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            DELIVERY_COLS
        ),
        &[&limit, &offset],
    )?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM webhook_deliveries", [], |r| r.get(0))?;
    Ok((items, total))
}

// ============ Activity log ============

pub fn append_activity(
    conn: &Connection,
    kind: ActivityKind,
    description: &str,
    metadata: Option<&serde_json::Value>,
) -> Result<ActivityEntry> {
    conn.query_row(
        &format!(
            "INSERT INTO activity_log (kind, description, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4) RETURNING {}",
            ACTIVITY_COLS
        ),
        params![kind.as_ref(), description, json_text(metadata), now()],
        ActivityEntry::from_row,
    )
    .map_err(Into::into)
}

pub fn list_activity_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ActivityEntry>, i64)> {
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM activity_log ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            ACTIVITY_COLS
        ),
        &[&limit, &offset],
    )?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM activity_log", [], |r| r.get(0))?;
    Ok((items, total))
}
