//! # Voucher payment server
//!
//! The HTTP ingress layer for the voucher payment gateway. It is responsible for:
//! * Receiving the wallet gateway's asynchronous IPN callbacks and verifying their signatures.
//! * Serving the buyer-facing payment creation, status polling, and client-sync endpoints.
//! * Serving the operator refund endpoint.
//! * Forwarding completed orders to the bookkeeping sheet webhook and dispatching notification
//!   emails off the request path.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
//!
//! ## Routes
//! * `/health`: liveness check.
//! * `POST /payment`: register a payment intent and obtain the gateway redirect URL.
//! * `POST /payment/ipn`: the gateway's server-to-server notification callback.
//! * `GET /payment/status`: the buyer's polling endpoint.
//! * `POST /payment/sync`: the client's "I just paid" reconciliation call.
//! * `POST /payment/refund`: operator-initiated refunds.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
