//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a TEXT column holding JSON into a `serde_json::Value`, converting
/// parse errors to rusqlite errors instead of panicking on corrupt rows.
fn parse_json(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<Option<serde_json::Value>> {
    match row.get::<_, Option<String>>(col)? {
        None => Ok(None),
        Some(text) => serde_json::from_str(&text).map(Some).map_err(|_| {
            rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
        }),
    }
}

/// Parse a string column into an enum type.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row, enabling the
/// `query_one` / `query_all` helpers.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const PRODUCT_COLS: &str =
    "id, name, description, price, currency, active, created_at, updated_at";

pub const CHECKOUT_COLS: &str =
    "id, product_id, title, slug, redirect_url, active, created_at, updated_at";

pub const CUSTOMER_COLS: &str = "id, name, email, phone, created_at, updated_at";

pub const TRANSACTION_COLS: &str = "id, reference, checkout_id, customer_name, customer_email, amount, currency, status, method, metadata, created_at, updated_at";

pub const SUBSCRIPTION_COLS: &str = "id, event, url, active, created_at, updated_at";

pub const DELIVERY_COLS: &str = "id, event, url, succeeded, payload, processed_at";

pub const ACTIVITY_COLS: &str = "id, kind, description, metadata, created_at";

// ============ FromRow Implementations ============

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            currency: row.get(4)?,
            active: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Checkout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Checkout {
            id: row.get(0)?,
            product_id: row.get(1)?,
            title: row.get(2)?,
            slug: row.get(3)?,
            redirect_url: row.get(4)?,
            active: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Customer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Customer {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for Transaction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: row.get(0)?,
            reference: row.get(1)?,
            checkout_id: row.get(2)?,
            customer_name: row.get(3)?,
            customer_email: row.get(4)?,
            amount: row.get(5)?,
            currency: row.get(6)?,
            status: row.get(7)?,
            method: row.get(8)?,
            metadata: parse_json(row, 9, "metadata")?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

impl FromRow for WebhookSubscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WebhookSubscription {
            id: row.get(0)?,
            event: row.get(1)?,
            url: row.get(2)?,
            active: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for WebhookDelivery {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let payload = parse_json(row, 4, "payload")?.unwrap_or(serde_json::Value::Null);
        Ok(WebhookDelivery {
            id: row.get(0)?,
            event: row.get(1)?,
            url: row.get(2)?,
            succeeded: row.get(3)?,
            payload,
            processed_at: row.get(5)?,
        })
    }
}

impl FromRow for ActivityEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ActivityEntry {
            id: row.get(0)?,
            kind: parse_enum(row, 1, "kind")?,
            description: row.get(2)?,
            metadata: parse_json(row, 3, "metadata")?,
            created_at: row.get(4)?,
        })
    }
}
