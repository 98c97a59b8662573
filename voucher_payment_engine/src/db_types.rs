use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;
use vpg_common::Vnd;

//--------------------------------------      OrderId       ----------------------------------------------------------
/// The client-assigned identifier for one purchase. Opaque, stable for the life of the
/// transaction across all three reporting channels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    OrderStatus     ----------------------------------------------------------
/// The settlement state of an order.
///
/// Statuses are ordered monotonically by [`OrderStatus::rank`]: `Pending` < the settled states
/// (`Paid`, `Failed`, `Free`) < the refund states. A channel may never move an order to a
/// lower-ranked status, no matter how late or how often it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Payment intent recorded, no settlement reported by any channel yet.
    Pending,
    /// The gateway (or the client, pending gateway confirmation) reported a successful payment.
    Paid,
    /// The gateway explicitly reported a failed payment. Never set on transport errors.
    Failed,
    /// A zero-amount order settled without going through the gateway.
    Free,
    /// The full paid amount was returned to the buyer.
    Refunded,
    /// Part of the paid amount was returned to the buyer.
    PartiallyRefunded,
}

impl OrderStatus {
    /// Position in the monotonic status ordering.
    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Paid | OrderStatus::Failed | OrderStatus::Free => 1,
            OrderStatus::Refunded | OrderStatus::PartiallyRefunded => 2,
        }
    }

    /// A terminal success state: the order is complete and eligible for downstream forwarding.
    pub fn is_settled_success(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Free)
    }

    pub fn is_refund(&self) -> bool {
        matches!(self, OrderStatus::Refunded | OrderStatus::PartiallyRefunded)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Paid => write!(f, "PAID"),
            OrderStatus::Failed => write!(f, "FAILED"),
            OrderStatus::Free => write!(f, "FREE"),
            OrderStatus::Refunded => write!(f, "REFUNDED"),
            OrderStatus::PartiallyRefunded => write!(f, "PARTIALLY_REFUNDED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "FREE" => Ok(Self::Free),
            "REFUNDED" => Ok(Self::Refunded),
            "PARTIALLY_REFUNDED" => Ok(Self::PartiallyRefunded),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status in storage: {value}. Defaulting to PENDING");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------     FormData       ----------------------------------------------------------
/// Buyer and recipient contact details plus the free-text greeting.
///
/// The gateway never stores or returns these, which is the entire reason reconciliation exists:
/// they ride along in the extra-data token or arrive on the client sync call, and whichever
/// channel supplies them first wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormData {
    pub sender_name: Option<String>,
    pub sender_phone: Option<String>,
    pub sender_email: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
}

impl FormData {
    pub fn is_empty(&self) -> bool {
        self.sender_name.is_none()
            && self.sender_phone.is_none()
            && self.sender_email.is_none()
            && self.recipient_name.is_none()
            && self.recipient_phone.is_none()
            && self.recipient_email.is_none()
            && self.message.is_none()
    }
}

//--------------------------------------       Order        ----------------------------------------------------------
/// The central record: one buyer transaction from intent to terminal settlement or refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub amount: Option<Vnd>,
    pub service_name: Option<String>,
    pub form_data: Option<FormData>,
    pub gateway_tx_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, after a confirmed-successful downstream forward. While this is `None`
    /// the order remains a candidate for forwarding on every reconciliation pass.
    pub synced_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A fresh order record as it exists before any channel has reported anything.
    pub fn pending(order_id: OrderId) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            status: OrderStatus::Pending,
            amount: None,
            service_name: None,
            form_data: None,
            gateway_tx_id: None,
            created_at: now,
            updated_at: now,
            synced_at: None,
        }
    }

    /// Eligible for a downstream forward: settled successfully, complete enough to be worth
    /// bookkeeping, and not already forwarded.
    pub fn is_sync_candidate(&self) -> bool {
        self.status.is_settled_success() && self.form_data.is_some() && self.synced_at.is_none()
    }
}

//--------------------------------------      Channel       ----------------------------------------------------------
/// Which ingress path produced an update. Gateway-backed channels carry authoritative amounts;
/// the client channel only ever fills gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The gateway's asynchronous server-to-server notification.
    Ipn,
    /// A synchronous status query placed on the buyer's behalf.
    StatusPoll,
    /// The buyer's client reporting the payment itself, with the full form data.
    ClientSync,
    /// An operator-initiated refund confirmed by the gateway.
    Refund,
}

impl Channel {
    /// Whether amounts reported on this channel come from the gateway and override a
    /// client-guessed amount.
    pub fn is_gateway_authoritative(&self) -> bool {
        !matches!(self, Channel::ClientSync)
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Ipn => write!(f, "ipn"),
            Channel::StatusPoll => write!(f, "status-poll"),
            Channel::ClientSync => write!(f, "client-sync"),
            Channel::Refund => write!(f, "refund"),
        }
    }
}

//--------------------------------------    OrderUpdate     ----------------------------------------------------------
/// A (possibly partial) view of an order as reported by one channel. All reconciliation flows
/// through [`crate::ReconciliationApi::process_update`] with one of these; no endpoint mutates an
/// order any other way.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub amount: Option<Vnd>,
    pub gateway_tx_id: Option<String>,
    pub form_data: Option<FormData>,
    pub service_name: Option<String>,
    pub channel: Channel,
}

impl OrderUpdate {
    pub fn new(order_id: OrderId, status: OrderStatus, channel: Channel) -> Self {
        Self { order_id, status, amount: None, gateway_tx_id: None, form_data: None, service_name: None, channel }
    }

    pub fn with_amount(mut self, amount: Vnd) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_gateway_tx_id<S: Into<String>>(mut self, tx_id: S) -> Self {
        self.gateway_tx_id = Some(tx_id.into());
        self
    }

    pub fn with_form_data(mut self, form_data: FormData) -> Self {
        self.form_data = Some(form_data);
        self
    }

    pub fn with_service_name<S: Into<String>>(mut self, service_name: S) -> Self {
        self.service_name = Some(service_name.into());
        self
    }
}
