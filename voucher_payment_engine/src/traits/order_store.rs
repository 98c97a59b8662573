use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Order, OrderId};

/// A durable keyed map from order id to [`Order`].
///
/// Implementations must provide merge-safe upserts: a stored non-null `form_data`,
/// `service_name` or `gateway_tx_id` is never replaced by null, and a stored `synced_at` is never
/// cleared, even when the written record carries less information than what is on disk. The
/// reconciliation engine produces already-merged records, but a concurrent writer may have filled
/// a field between this writer's read and its write; the guard keeps that race lossless.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// Fetch the record for `order_id`, or `None` if no channel has reported it yet.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Insert or merge-update the record, per the field guards above.
    async fn upsert_order(&self, order: &Order) -> Result<(), OrderStoreError>;

    /// Record the one-time sync stamp iff it is not already set.
    ///
    /// Returns `true` when *this* call recorded the stamp, `false` when another writer got there
    /// first. This is the arbiter that keeps `synced_at` single-assignment under racing channels.
    async fn mark_synced(&self, order_id: &OrderId, at: DateTime<Utc>) -> Result<bool, OrderStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Storage backend error: {0}")]
    BackendError(String),
    #[error("Stored record for {0} could not be decoded: {1}")]
    CorruptRecord(OrderId, String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::BackendError(e.to_string())
    }
}
