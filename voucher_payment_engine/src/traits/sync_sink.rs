use thiserror::Error;
use vpg_common::Vnd;

use crate::db_types::Order;

/// The downstream bookkeeping sink.
///
/// `forward` carries a completed order; `forward_refund` carries a refund record for an order
/// that was already forwarded. Implementations must not retry internally: a failed forward leaves
/// the order unsynced and the next reconciliation pass retries naturally.
#[allow(async_fn_in_trait)]
pub trait SyncSink {
    async fn forward(&self, order: &Order) -> Result<(), SyncError>;

    async fn forward_refund(&self, order: &Order, refund_amount: Vnd, refund_tx_id: &str) -> Result<(), SyncError>;
}

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("The sink could not be reached: {0}")]
    Unreachable(String),
    #[error("The sink rejected the record. HTTP {status}. {message}")]
    Rejected { status: u16, message: String },
}
