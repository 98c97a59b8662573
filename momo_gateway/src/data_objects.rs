use serde::{Deserialize, Serialize};
use vpg_common::Secret;

use crate::signature;

/// The result code the gateway uses for a successful operation. Every other explicit code is a
/// failure; the *absence* of a code (transport error) is unknown, not failure.
pub const RESULT_CODE_SUCCESS: i64 = 0;

/// The settlement outcome reported by the gateway for a payment or refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Failed { code: i64, message: String },
}

impl PaymentOutcome {
    pub fn from_result_code(code: i64, message: &str) -> Self {
        if code == RESULT_CODE_SUCCESS {
            Self::Success
        } else {
            Self::Failed { code, message: message.to_string() }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

//------------------------------------   Create payment   ------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub partner_code: String,
    pub request_id: String,
    pub amount: i64,
    pub order_id: String,
    pub order_info: String,
    pub redirect_url: String,
    pub ipn_url: String,
    pub request_type: String,
    pub extra_data: String,
    pub lang: String,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub result_code: i64,
    #[serde(default)]
    pub message: String,
    /// The browser redirect URL for the buyer to complete payment.
    #[serde(default)]
    pub pay_url: Option<String>,
    /// Wallet-app deeplink, when the gateway offers one.
    #[serde(default)]
    pub deeplink: Option<String>,
    #[serde(default)]
    pub qr_code_url: Option<String>,
    #[serde(default)]
    pub response_time: Option<i64>,
}

impl CreatePaymentResponse {
    pub fn outcome(&self) -> PaymentOutcome {
        PaymentOutcome::from_result_code(self.result_code, &self.message)
    }
}

//------------------------------------   Query status   --------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPaymentRequest {
    pub partner_code: String,
    pub request_id: String,
    pub order_id: String,
    pub lang: String,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPaymentResponse {
    pub result_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub amount: Option<i64>,
    /// The gateway settlement id. Zero/absent until the payment completes.
    #[serde(default)]
    pub trans_id: Option<i64>,
    /// The extra-data token we attached at creation, echoed back verbatim.
    #[serde(default)]
    pub extra_data: String,
    #[serde(default)]
    pub pay_type: String,
    #[serde(default)]
    pub response_time: Option<i64>,
}

impl QueryPaymentResponse {
    pub fn outcome(&self) -> PaymentOutcome {
        PaymentOutcome::from_result_code(self.result_code, &self.message)
    }
}

//------------------------------------   Refund   --------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub partner_code: String,
    pub request_id: String,
    /// A fresh order id for the refund transaction itself.
    pub order_id: String,
    pub amount: i64,
    /// The settlement id of the payment being refunded.
    pub trans_id: i64,
    pub description: String,
    pub lang: String,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    pub result_code: i64,
    #[serde(default)]
    pub message: String,
    /// The gateway id of the refund transaction.
    #[serde(default)]
    pub trans_id: Option<i64>,
    #[serde(default)]
    pub response_time: Option<i64>,
}

impl RefundResponse {
    pub fn outcome(&self) -> PaymentOutcome {
        PaymentOutcome::from_result_code(self.result_code, &self.message)
    }
}

//------------------------------------   IPN callback   --------------------------------------------------------------

/// The asynchronous server-to-server notification the gateway posts after a payment attempt.
///
/// Delivery is at-least-once and unordered with respect to the other channels. The body carries
/// its own signature over the [`signature::ipn_fields`] canonical order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpnPayload {
    pub partner_code: String,
    pub order_id: String,
    pub request_id: String,
    pub amount: i64,
    #[serde(default)]
    pub order_info: String,
    #[serde(default)]
    pub order_type: String,
    #[serde(default)]
    pub trans_id: i64,
    pub result_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub pay_type: String,
    #[serde(default)]
    pub response_time: i64,
    #[serde(default)]
    pub extra_data: String,
    pub signature: String,
}

impl IpnPayload {
    pub fn outcome(&self) -> PaymentOutcome {
        PaymentOutcome::from_result_code(self.result_code, &self.message)
    }

    /// Check the embedded signature against the canonical IPN field order.
    pub fn verify_signature(&self, access_key: &str, secret: &Secret<String>) -> bool {
        let amount = self.amount.to_string();
        let trans_id = self.trans_id.to_string();
        let result_code = self.result_code.to_string();
        let response_time = self.response_time.to_string();
        let fields = signature::ipn_fields(
            access_key,
            &amount,
            &self.extra_data,
            &self.message,
            &self.order_id,
            &self.order_info,
            &self.order_type,
            &self.partner_code,
            &self.pay_type,
            &self.request_id,
            &response_time,
            &result_code,
            &trans_id,
        );
        signature::verify(secret, &fields, &self.signature)
    }

    /// Sign the payload fields with the given key pair, returning the signature value. Used by
    /// tests and by gateway simulators; the production path only ever verifies.
    pub fn compute_signature(&self, access_key: &str, secret: &Secret<String>) -> String {
        let amount = self.amount.to_string();
        let trans_id = self.trans_id.to_string();
        let result_code = self.result_code.to_string();
        let response_time = self.response_time.to_string();
        let fields = signature::ipn_fields(
            access_key,
            &amount,
            &self.extra_data,
            &self.message,
            &self.order_id,
            &self.order_info,
            &self.order_type,
            &self.partner_code,
            &self.pay_type,
            &self.request_id,
            &response_time,
            &result_code,
            &trans_id,
        );
        signature::sign(secret, &fields)
    }
}
