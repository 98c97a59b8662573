//! Signed HTTP client for the MoMo e-wallet payment gateway.
//!
//! The gateway is consumed as a signed JSON-over-HTTPS API with three calls (create a payment,
//! query its status, refund a settled payment) plus an asynchronous IPN callback that the gateway
//! posts back to us. All requests and the IPN body carry an HMAC-SHA256 signature over a
//! canonically ordered query-string rendering of the fields; the [`signature`] module implements
//! both directions.
//!
//! Two things are deliberate here and load-bearing for the callers:
//! * A transport failure (timeout, connection refused, non-2xx) is returned as an error and must
//!   be treated as *unknown*, never as a failed payment. Only an explicit non-zero result code
//!   from the gateway marks a payment as failed.
//! * Refund amounts are validated against the gateway's accepted bounds *before* any signed call
//!   is placed.

pub mod api;
pub mod config;
pub mod data_objects;
mod error;
pub mod signature;

pub use api::{validate_refund_amount, MomoApi, PaymentGateway};
pub use config::MomoConfig;
pub use data_objects::{
    CreatePaymentRequest,
    CreatePaymentResponse,
    IpnPayload,
    PaymentOutcome,
    QueryPaymentResponse,
    RefundRequest,
    RefundResponse,
    RESULT_CODE_SUCCESS,
};
pub use error::MomoApiError;

use vpg_common::Vnd;

/// Smallest refund the gateway accepts.
pub const MIN_REFUND: Vnd = Vnd::new(1_000);
/// Largest refund the gateway accepts in a single call.
pub const MAX_REFUND: Vnd = Vnd::new(50_000_000);
