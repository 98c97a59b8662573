use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use momo_gateway::MomoApiError;
use thiserror::Error;
use voucher_payment_engine::ReconcileError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("{0}")]
    BusinessRuleViolation(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The payment gateway rejected the request. {0}")]
    GatewayRejected(String),
    #[error("The payment gateway could not be reached. {0}")]
    GatewayUnreachable(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::BusinessRuleViolation(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayRejected(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayUnreachable(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<MomoApiError> for ServerError {
    fn from(e: MomoApiError) -> Self {
        match e {
            MomoApiError::InvalidRefundAmount(_) => Self::ValidationError(e.to_string()),
            MomoApiError::Unreachable(_) => Self::GatewayUnreachable(e.to_string()),
            MomoApiError::QueryError { .. } | MomoApiError::JsonError(_) => Self::GatewayRejected(e.to_string()),
            MomoApiError::Initialization(_) => Self::InitializeError(e.to_string()),
        }
    }
}

impl From<ReconcileError> for ServerError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist.")),
            ReconcileError::RefundNotAllowed(_) => Self::BusinessRuleViolation(e.to_string()),
            ReconcileError::StorageError(_) => Self::BackendError(e.to_string()),
        }
    }
}
