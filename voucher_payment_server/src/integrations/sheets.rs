//! The bookkeeping sheet sink.
//!
//! Completed orders are forwarded exactly once (recorded-success-wise) as one flat,
//! human-readable JSON object to a spreadsheet webhook. The sink never retries internally;
//! a failed forward leaves the order unsynced and the next reconciliation pass tries again.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset, Utc};
use log::*;
use reqwest::Client;
use serde_json::json;
use vpg_common::Vnd;
use voucher_payment_engine::{
    db_types::{FormData, Order},
    traits::{SyncError, SyncSink},
};

use crate::errors::ServerError;

/// Forwards are bounded so a stuck sink cannot hold a reconciliation pass forever.
const SINK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct SheetSink {
    url: String,
    client: Arc<Client>,
}

impl SheetSink {
    pub fn new(url: String) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(SINK_TIMEOUT)
            .build()
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { url, client: Arc::new(client) })
    }

    async fn post_record(&self, record: serde_json::Value) -> Result<(), SyncError> {
        let response = self
            .client
            .post(&self.url)
            .json(&record)
            .send()
            .await
            .map_err(|e| SyncError::Unreachable(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(SyncError::Rejected { status, message })
        }
    }
}

impl SyncSink for SheetSink {
    async fn forward(&self, order: &Order) -> Result<(), SyncError> {
        debug!("🧾️ Forwarding order {} to the bookkeeping sheet", order.order_id);
        let form = order.form_data.clone().unwrap_or_default();
        let record = flat_record(order, &form);
        self.post_record(record).await?;
        info!("🧾️ Order {} forwarded to the bookkeeping sheet", order.order_id);
        Ok(())
    }

    async fn forward_refund(&self, order: &Order, refund_amount: Vnd, refund_tx_id: &str) -> Result<(), SyncError> {
        debug!("🧾️ Forwarding refund record for order {}", order.order_id);
        let form = order.form_data.clone().unwrap_or_default();
        let mut record = flat_record(order, &form);
        record["type"] = json!("refund");
        record["refundAmount"] = json!(refund_amount.value());
        record["refundTransId"] = json!(refund_tx_id);
        self.post_record(record).await?;
        info!("🧾️ Refund record for order {} forwarded to the bookkeeping sheet", order.order_id);
        Ok(())
    }
}

fn flat_record(order: &Order, form: &FormData) -> serde_json::Value {
    json!({
        "orderId": order.order_id.as_str(),
        "status": order.status.to_string(),
        "amount": order.amount.map(|a| a.value()),
        "transId": order.gateway_tx_id,
        "serviceName": order.service_name,
        "senderName": form.sender_name,
        "senderPhone": form.sender_phone,
        "senderEmail": form.sender_email,
        "recipientName": form.recipient_name,
        "recipientPhone": form.recipient_phone,
        "recipientEmail": form.recipient_email,
        "message": form.message,
        "recordedAt": local_timestamp(order.updated_at),
    })
}

// Sheet rows are read by people in Vietnam; render the timestamp in their local time.
fn local_timestamp(at: DateTime<Utc>) -> String {
    let indochina = FixedOffset::east_opt(7 * 3600).expect("UTC+7 is a valid offset");
    at.with_timezone(&indochina).format("%d/%m/%Y %H:%M:%S").to_string()
}
