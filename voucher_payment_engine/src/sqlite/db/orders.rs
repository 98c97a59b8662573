use chrono::{DateTime, Utc};
use log::{trace, warn};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{FormData, Order, OrderId, OrderStatus},
    traits::OrderStoreError,
};

pub async fn create_tables(conn: &mut SqliteConnection) -> Result<(), OrderStoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            order_id      TEXT PRIMARY KEY NOT NULL,
            status        TEXT NOT NULL DEFAULT 'PENDING',
            amount        INTEGER,
            service_name  TEXT,
            form_data     TEXT,
            gateway_tx_id TEXT,
            created_at    TIMESTAMP NOT NULL,
            updated_at    TIMESTAMP NOT NULL,
            synced_at     TIMESTAMP
        );
    "#,
    )
    .execute(conn)
    .await?;
    Ok(())
}

/// Row shape as stored; `form_data` is a JSON blob so the record stays human-inspectable with any
/// sqlite client.
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    order_id: String,
    status: String,
    amount: Option<i64>,
    service_name: Option<String>,
    form_data: Option<String>,
    gateway_tx_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    synced_at: Option<DateTime<Utc>>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        let form_data: Option<FormData> = row.form_data.and_then(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| warn!("📝️ Discarding undecodable form data for order {}: {e}", row.order_id))
                .ok()
        });
        Order {
            order_id: OrderId(row.order_id),
            status: OrderStatus::from(row.status),
            amount: row.amount.map(Into::into),
            service_name: row.service_name,
            form_data,
            gateway_tx_id: row.gateway_tx_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            synced_at: row.synced_at,
        }
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Order::from))
}

/// Insert or merge-update the record.
///
/// The `COALESCE` guards implement the fill-once invariants at the storage layer: a field that a
/// concurrent writer filled between this writer's read and its write is kept, and `synced_at` is
/// never cleared once set.
pub async fn upsert_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), OrderStoreError> {
    let form_data = match &order.form_data {
        Some(fd) => Some(
            serde_json::to_string(fd)
                .map_err(|e| OrderStoreError::BackendError(format!("Could not serialize form data: {e}")))?,
        ),
        None => None,
    };
    sqlx::query(
        r#"
        INSERT INTO orders (
            order_id, status, amount, service_name, form_data, gateway_tx_id, created_at, updated_at, synced_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (order_id) DO UPDATE SET
            status        = excluded.status,
            amount        = excluded.amount,
            service_name  = COALESCE(orders.service_name, excluded.service_name),
            form_data     = COALESCE(orders.form_data, excluded.form_data),
            gateway_tx_id = COALESCE(orders.gateway_tx_id, excluded.gateway_tx_id),
            updated_at    = excluded.updated_at,
            synced_at     = COALESCE(orders.synced_at, excluded.synced_at);
    "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.status.to_string())
    .bind(order.amount.map(|a| a.value()))
    .bind(&order.service_name)
    .bind(form_data)
    .bind(&order.gateway_tx_id)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.synced_at)
    .execute(conn)
    .await?;
    trace!("📝️ Order {} written", order.order_id);
    Ok(())
}

/// Conditionally stamp the sync time. Returns `true` iff this call set it.
pub async fn mark_synced(
    order_id: &OrderId,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderStoreError> {
    let result = sqlx::query("UPDATE orders SET synced_at = $2, updated_at = $2 WHERE order_id = $1 AND synced_at IS NULL")
        .bind(order_id.as_str())
        .bind(at)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
