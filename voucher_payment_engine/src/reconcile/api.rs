use std::fmt::Debug;

use chrono::Utc;
use log::*;
use vpg_common::Vnd;

use crate::{
    db_types::{Channel, Order, OrderId, OrderStatus, OrderUpdate},
    events::{EventProducers, OrderSyncedEvent},
    reconcile::{merge_update, MergeOutcome, ReconcileError},
    traits::{OrderStore, SyncSink},
};

/// The result of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The merged record (the stored one, when the update was ignored as a regression).
    pub order: Order,
    /// Whether the update survived the monotonic status check and was merged.
    pub applied: bool,
    /// Whether *this* pass recorded the one-time downstream sync.
    pub synced_now: bool,
}

/// `ReconciliationApi` is the single write path for orders: every channel's report funnels
/// through [`Self::process_update`], which merges it into the stored record and performs the
/// one-time downstream forward when the order becomes complete.
///
/// No lock is held across the read, the merge, and the write. Racing channels are resolved by the
/// merge rules plus the double-checked, storage-arbitrated sync stamp: the worst a race can
/// produce is a duplicate forward to the (idempotent-enough) sink, never a missed one and never a
/// double-recorded success.
pub struct ReconciliationApi<B, S> {
    store: B,
    sink: S,
    producers: EventProducers,
}

impl<B, S> Debug for ReconciliationApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, S> ReconciliationApi<B, S> {
    pub fn new(store: B, sink: S, producers: EventProducers) -> Self {
        Self { store, sink, producers }
    }
}

impl<B, S> ReconciliationApi<B, S>
where
    B: OrderStore,
    S: SyncSink,
{
    /// Merge one channel's report into the authoritative record.
    ///
    /// The store read happens first; an absent record is treated as a fresh `PENDING` order (the
    /// channels race, and the client's initial intent write may not have landed yet). A write
    /// failure after the merge is logged and swallowed: losing local state must never block
    /// acknowledging the upstream gateway, and the sync attempt below still runs off the
    /// in-memory merged record because the downstream sink, not this store, is the system of
    /// record for the business.
    pub async fn process_update(&self, update: OrderUpdate) -> Result<ReconcileOutcome, ReconcileError> {
        let channel = update.channel;
        let existing = self.store.fetch_order(&update.order_id).await?;
        let base = existing.unwrap_or_else(|| Order::pending(update.order_id.clone()));
        let mut merged = match merge_update(&base, &update) {
            MergeOutcome::Merged(order) => order,
            MergeOutcome::Regression => {
                debug!(
                    "🔄️ Ignoring {channel} report of {} for order {}: stored status {} outranks it",
                    update.status, base.order_id, base.status
                );
                return Ok(ReconcileOutcome { order: base, applied: false, synced_now: false });
            },
            MergeOutcome::RefundFromUnpaid => {
                return Err(ReconcileError::RefundNotAllowed(update.order_id.clone()));
            },
        };
        debug!("🔄️ Order {} is now {} after {channel} report", merged.order_id, merged.status);
        if let Err(e) = self.store.upsert_order(&merged).await {
            warn!(
                "🔄️ Could not persist order {} after {channel} report: {e}. Continuing with the in-memory record.",
                merged.order_id
            );
        }
        let synced_now = self.sync_if_complete(&mut merged).await;
        Ok(ReconcileOutcome { order: merged, applied: true, synced_now })
    }

    /// Record a gateway-confirmed refund against a paid order and forward the refund record
    /// downstream (best effort; the refund already happened at the gateway either way).
    pub async fn record_refund(
        &self,
        order_id: &OrderId,
        refund_amount: Vnd,
        refund_tx_id: &str,
    ) -> Result<Order, ReconcileError> {
        let existing = self
            .store
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| ReconcileError::OrderNotFound(order_id.clone()))?;
        if existing.status != OrderStatus::Paid && !existing.status.is_refund() {
            return Err(ReconcileError::RefundNotAllowed(order_id.clone()));
        }
        let full_refund = existing.amount.map(|paid| refund_amount >= paid).unwrap_or(false);
        let status = if full_refund { OrderStatus::Refunded } else { OrderStatus::PartiallyRefunded };
        let outcome = self.process_update(OrderUpdate::new(order_id.clone(), status, Channel::Refund)).await?;
        if let Err(e) = self.sink.forward_refund(&outcome.order, refund_amount, refund_tx_id).await {
            warn!("🔄️ Could not forward refund record for order {order_id}: {e}");
        }
        info!("🔄️ Order {order_id} is now {} after a {refund_amount} refund", outcome.order.status);
        Ok(outcome.order)
    }

    /// The double-checked, one-time downstream forward.
    ///
    /// Eligibility requires a settled-successful status, form data present, and no recorded sync.
    /// The record is re-read immediately before dispatching to catch a concurrent pass that
    /// already synced; the remaining gap between that check and the forward call can only produce
    /// a duplicate forward, which the conditional [`OrderStore::mark_synced`] then refuses to
    /// record twice. The synced event (and with it the notification emails) fires only from the
    /// pass that actually recorded the stamp.
    async fn sync_if_complete(&self, order: &mut Order) -> bool {
        if !order.is_sync_candidate() {
            if order.status.is_settled_success() && order.form_data.is_none() {
                debug!("🔄️ Order {} is settled but has no form data yet; holding the sync back", order.order_id);
            }
            return false;
        }
        match self.store.fetch_order(&order.order_id).await {
            Ok(Some(current)) if current.synced_at.is_some() => {
                trace!("🔄️ Order {} was synced by a concurrent report", order.order_id);
                order.synced_at = current.synced_at;
                return false;
            },
            Ok(_) => {},
            Err(e) => {
                // A failed re-read must not block the forward: a duplicate downstream write is
                // acceptable, a missed one is not.
                warn!("🔄️ Pre-sync re-read failed for order {}: {e}", order.order_id);
            },
        }
        if let Err(e) = self.sink.forward(order).await {
            warn!("🔄️ Downstream sync failed for order {}: {e}. A later report will retry.", order.order_id);
            return false;
        }
        let now = Utc::now();
        let recorded = match self.store.mark_synced(&order.order_id, now).await {
            Ok(recorded) => recorded,
            Err(e) => {
                warn!(
                    "🔄️ Order {} was forwarded but the sync stamp could not be written: {e}. A later report may \
                     forward it again.",
                    order.order_id
                );
                true
            },
        };
        order.synced_at = Some(now);
        if recorded {
            info!("🔄️ Order {} forwarded downstream and stamped as synced", order.order_id);
            self.notify_order_synced(order).await;
        } else {
            trace!("🔄️ Order {} was stamped by a concurrent report during our forward", order.order_id);
        }
        recorded
    }

    async fn notify_order_synced(&self, order: &Order) {
        for producer in &self.producers.order_synced_producer {
            debug!("🔄️📬️ Notifying order-synced subscribers for {}", order.order_id);
            producer.publish_event(OrderSyncedEvent::new(order.clone())).await;
        }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
