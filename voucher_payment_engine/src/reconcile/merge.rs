use chrono::Utc;

use crate::db_types::{Order, OrderStatus, OrderUpdate};

/// The result of merging one channel's report into the stored record.
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    Merged(Order),
    /// The proposed status ranks strictly below the stored one. The whole update is ignored.
    Regression,
    /// A refund status was proposed for an order that never reached `Paid`.
    RefundFromUnpaid,
}

/// Merge a channel update into the existing record. This is the single reconciliation rule set;
/// every endpoint funnels through it.
///
/// * Status: monotonic by [`OrderStatus::rank`]. A strictly lower rank is rejected outright; an
///   equal rank keeps the stored status but still merges the data fields, so a second channel
///   reporting the same settlement can contribute the form data the first one lacked.
/// * `form_data` / `service_name` / `gateway_tx_id`: fill-once. The first channel to supply a
///   value wins; later values for an already-filled field are ignored.
/// * `amount`: the gateway knows best. On gateway-backed channels the proposed amount replaces a
///   stored (possibly client-guessed) one; on the client channel it only fills an absent amount.
/// * `created_at` and `synced_at` are never touched here.
pub fn merge_update(existing: &Order, update: &OrderUpdate) -> MergeOutcome {
    if update.status.rank() < existing.status.rank() {
        return MergeOutcome::Regression;
    }
    if update.status.is_refund() && existing.status != OrderStatus::Paid && !existing.status.is_refund() {
        return MergeOutcome::RefundFromUnpaid;
    }
    let status = if update.status.rank() > existing.status.rank() { update.status } else { existing.status };
    let amount = if update.channel.is_gateway_authoritative() {
        update.amount.or(existing.amount)
    } else {
        existing.amount.or(update.amount)
    };
    let proposed_form = update.form_data.clone().filter(|fd| !fd.is_empty());
    MergeOutcome::Merged(Order {
        order_id: existing.order_id.clone(),
        status,
        amount,
        service_name: existing.service_name.clone().or_else(|| update.service_name.clone()),
        form_data: existing.form_data.clone().or(proposed_form),
        gateway_tx_id: existing.gateway_tx_id.clone().or_else(|| update.gateway_tx_id.clone()),
        created_at: existing.created_at,
        updated_at: Utc::now(),
        synced_at: existing.synced_at,
    })
}
