//! Interface contracts for the engine's injectable collaborators.
//!
//! * [`OrderStore`] is the durable keyed map holding one record per order id. Backends only need
//!   single-key reads and read-modify-write upserts; cross-order races are resolved by the
//!   reconciliation rules, not by storage-level locking.
//! * [`SyncSink`] is the downstream bookkeeping sink that receives each completed order exactly
//!   once (recorded-success-wise; the forward itself is at-least-once-attempted).

mod order_store;
mod sync_sink;

pub use order_store::{OrderStore, OrderStoreError};
pub use sync_sink::{SyncError, SyncSink};
