use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};
use vpg_common::Vnd;

use crate::{
    config::MomoConfig,
    data_objects::{
        CreatePaymentRequest,
        CreatePaymentResponse,
        QueryPaymentRequest,
        QueryPaymentResponse,
        RefundRequest,
        RefundResponse,
    },
    signature,
    MomoApiError,
    MAX_REFUND,
    MIN_REFUND,
};

/// How long we wait on any single gateway call before giving up and reporting "unknown".
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// The capture type requested at payment creation.
const REQUEST_TYPE_CAPTURE: &str = "captureWallet";

/// The signed operations the wallet gateway exposes. [`MomoApi`] is the production
/// implementation; endpoint handlers are generic over this trait so tests can substitute a mock.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Register a payment with the gateway and obtain the buyer-facing redirect URL.
    async fn create_payment(
        &self,
        order_id: &str,
        amount: Vnd,
        order_info: &str,
        extra_data: &str,
    ) -> Result<CreatePaymentResponse, MomoApiError>;

    /// Ask the gateway for the current settlement state of an order.
    async fn query_payment(&self, order_id: &str) -> Result<QueryPaymentResponse, MomoApiError>;

    /// Refund (part of) a settled payment. Amount bounds are validated before any signed call is
    /// placed.
    async fn refund(
        &self,
        order_id: &str,
        trans_id: i64,
        amount: Vnd,
        description: &str,
    ) -> Result<RefundResponse, MomoApiError>;
}

#[derive(Clone)]
pub struct MomoApi {
    config: MomoConfig,
    client: Arc<Client>,
}

impl MomoApi {
    pub fn new(config: MomoConfig) -> Result<Self, MomoApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| MomoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MomoConfig {
        &self.config
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, MomoApiError> {
        let url = format!("{}{path}", self.config.endpoint);
        trace!("💳️ Posting signed gateway request to {url}");
        let response =
            self.client.post(url).json(body).send().await.map_err(|e| MomoApiError::Unreachable(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ Gateway call successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MomoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MomoApiError::Unreachable(e.to_string()))?;
            Err(MomoApiError::QueryError { status, message })
        }
    }

    fn fresh_request_id(&self, order_id: &str) -> String {
        format!("{order_id}-{:08x}", rand::random::<u32>())
    }
}

impl PaymentGateway for MomoApi {
    async fn create_payment(
        &self,
        order_id: &str,
        amount: Vnd,
        order_info: &str,
        extra_data: &str,
    ) -> Result<CreatePaymentResponse, MomoApiError> {
        let cfg = &self.config;
        let request_id = self.fresh_request_id(order_id);
        let amount_str = amount.value().to_string();
        let fields = signature::create_fields(
            &cfg.access_key,
            &amount_str,
            extra_data,
            &cfg.ipn_url,
            order_id,
            order_info,
            &cfg.partner_code,
            &cfg.redirect_url,
            &request_id,
            REQUEST_TYPE_CAPTURE,
        );
        let sig = signature::sign(&cfg.secret_key, &fields);
        let body = CreatePaymentRequest {
            partner_code: cfg.partner_code.clone(),
            request_id,
            amount: amount.value(),
            order_id: order_id.to_string(),
            order_info: order_info.to_string(),
            redirect_url: cfg.redirect_url.clone(),
            ipn_url: cfg.ipn_url.clone(),
            request_type: REQUEST_TYPE_CAPTURE.to_string(),
            extra_data: extra_data.to_string(),
            lang: "vi".to_string(),
            signature: sig,
        };
        debug!("💳️ Creating payment for order {order_id} ({amount})");
        let response: CreatePaymentResponse = self.post("/v2/gateway/api/create", &body).await?;
        info!("💳️ Payment creation for order {order_id} returned result code {}", response.result_code);
        Ok(response)
    }

    async fn query_payment(&self, order_id: &str) -> Result<QueryPaymentResponse, MomoApiError> {
        let cfg = &self.config;
        let request_id = self.fresh_request_id(order_id);
        let fields = signature::query_fields(&cfg.access_key, order_id, &cfg.partner_code, &request_id);
        let sig = signature::sign(&cfg.secret_key, &fields);
        let body = QueryPaymentRequest {
            partner_code: cfg.partner_code.clone(),
            request_id,
            order_id: order_id.to_string(),
            lang: "vi".to_string(),
            signature: sig,
        };
        debug!("💳️ Querying payment status for order {order_id}");
        self.post("/v2/gateway/api/query", &body).await
    }

    async fn refund(
        &self,
        order_id: &str,
        trans_id: i64,
        amount: Vnd,
        description: &str,
    ) -> Result<RefundResponse, MomoApiError> {
        validate_refund_amount(amount)?;
        let cfg = &self.config;
        let refund_order_id = format!("{order_id}-rf-{:08x}", rand::random::<u32>());
        let request_id = self.fresh_request_id(order_id);
        let amount_str = amount.value().to_string();
        let trans_id_str = trans_id.to_string();
        let fields = signature::refund_fields(
            &cfg.access_key,
            &amount_str,
            description,
            &refund_order_id,
            &cfg.partner_code,
            &request_id,
            &trans_id_str,
        );
        let sig = signature::sign(&cfg.secret_key, &fields);
        let body = RefundRequest {
            partner_code: cfg.partner_code.clone(),
            request_id,
            order_id: refund_order_id,
            amount: amount.value(),
            trans_id,
            description: description.to_string(),
            lang: "vi".to_string(),
            signature: sig,
        };
        info!("💳️ Requesting refund of {amount} for order {order_id} (settlement {trans_id})");
        self.post("/v2/gateway/api/refund", &body).await
    }
}

/// Reject refund amounts the gateway would refuse anyway, before placing a signed call.
pub fn validate_refund_amount(amount: Vnd) -> Result<(), MomoApiError> {
    if amount < MIN_REFUND || amount > MAX_REFUND {
        return Err(MomoApiError::InvalidRefundAmount(amount));
    }
    Ok(())
}
