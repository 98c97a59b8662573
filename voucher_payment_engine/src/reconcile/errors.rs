use thiserror::Error;

use crate::{db_types::OrderId, traits::OrderStoreError};

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    StorageError(#[from] OrderStoreError),
    #[error("The order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} is not in a refundable state")]
    RefundNotAllowed(OrderId),
}
