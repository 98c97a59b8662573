//! Best-effort notification emails.
//!
//! At most two mails go out per order (sender receipt, recipient greeting), each gated on the
//! corresponding address being present, and only on the first-sync path: the reconciliation
//! engine publishes one `OrderSyncedEvent` per order and the mailer hangs off that hook, so a
//! slow relay never adds latency to a payment callback. Failures are logged and dropped.

use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use serde_json::json;
use vpg_common::Secret;
use voucher_payment_engine::db_types::Order;

use crate::{config::MailConfig, errors::ServerError};

const MAIL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Mailer {
    endpoint: String,
    api_key: Secret<String>,
    sender: String,
    client: Arc<Client>,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(MAIL_TIMEOUT)
            .build()
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            sender: config.sender.clone(),
            client: Arc::new(client),
        })
    }

    /// Fire the order's notification mails. Never fails; every problem is logged and dropped.
    pub async fn send_order_notifications(&self, order: &Order) {
        if self.endpoint.is_empty() {
            debug!("✉️ No mail endpoint configured; skipping notifications for order {}", order.order_id);
            return;
        }
        let Some(form) = &order.form_data else {
            // Orders without form data are never synced, so this should not happen.
            warn!("✉️ Order {} was synced without form data; no notifications to send", order.order_id);
            return;
        };
        let service = order.service_name.as_deref().unwrap_or("your voucher");
        if let Some(to) = form.sender_email.as_deref().filter(|s| !s.is_empty()) {
            let subject = format!("Your payment for {service} is confirmed");
            let text = format!(
                "Hi {},\n\nYour payment for order {} has been received. The voucher is on its way to {}.\n",
                form.sender_name.as_deref().unwrap_or("there"),
                order.order_id.as_str(),
                form.recipient_name.as_deref().unwrap_or("the recipient"),
            );
            self.send(to, &subject, &text).await;
        }
        if let Some(to) = form.recipient_email.as_deref().filter(|s| !s.is_empty()) {
            let subject = format!("{} sent you {service}", form.sender_name.as_deref().unwrap_or("Someone"));
            let text = match &form.message {
                Some(message) => format!("You have received a voucher!\n\n{message}\n"),
                None => "You have received a voucher!\n".to_string(),
            };
            self.send(to, &subject, &text).await;
        }
    }

    async fn send(&self, to: &str, subject: &str, text: &str) {
        let body = json!({
            "from": self.sender,
            "to": to,
            "subject": subject,
            "text": text,
        });
        let result = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.reveal())
            .json(&body)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                info!("✉️ Notification mail sent to {to}");
            },
            Ok(response) => {
                warn!("✉️ Mail relay rejected the notification to {to}: HTTP {}", response.status());
            },
            Err(e) => {
                warn!("✉️ Could not reach the mail relay for {to}: {e}");
            },
        }
    }
}
