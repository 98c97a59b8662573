use std::fmt::Display;

use serde::{Deserialize, Serialize};
use voucher_payment_engine::db_types::{FormData, Order, OrderStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }

    /// The acknowledgement body for the IPN endpoint. The gateway only looks at the status code,
    /// but the marker makes retries distinguishable from connection errors in its logs.
    pub fn received() -> Self {
        Self::success("received")
    }
}

//------------------------------------   Payment creation   ----------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentParams {
    pub order_id: String,
    pub amount: i64,
    #[serde(default)]
    pub form_data: Option<FormData>,
    #[serde(default)]
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResult {
    pub order_id: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deeplink: Option<String>,
}

//------------------------------------   Status query   --------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQueryParams {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub order_id: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_id: Option<String>,
    pub message: String,
}

impl StatusResult {
    pub fn from_order(order: &Order, message: impl Display) -> Self {
        Self {
            order_id: order.order_id.as_str().to_string(),
            status: order.status,
            amount: order.amount.map(|a| a.value()),
            trans_id: order.gateway_tx_id.clone(),
            message: message.to_string(),
        }
    }
}

//------------------------------------   Client sync   ---------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSyncParams {
    pub order_id: String,
    pub form_data: FormData,
    #[serde(default)]
    pub amount: Option<i64>,
    /// Defaults to `PAID` when absent; the call means "I just paid".
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub trans_id: Option<String>,
    /// Greeting text, accepted here as well for clients that keep it outside the form block.
    #[serde(default)]
    pub message: Option<String>,
}

//------------------------------------   Refund   --------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundParams {
    pub order_id: String,
    pub trans_id: i64,
    pub amount: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    pub order_id: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_trans_id: Option<String>,
}
