use thiserror::Error;
use vpg_common::Vnd;

#[derive(Debug, Error)]
pub enum MomoApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The gateway could not be reached: {0}")]
    Unreachable(String),
    #[error("Could not deserialize the gateway response: {0}")]
    JsonError(String),
    #[error("Gateway call failed. HTTP {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Refund amount {0} is outside the accepted range")]
    InvalidRefundAmount(Vnd),
}
