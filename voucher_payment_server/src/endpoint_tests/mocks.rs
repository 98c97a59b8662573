use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::Utc;
use mockall::mock;
use momo_gateway::{
    CreatePaymentResponse,
    MomoApiError,
    PaymentGateway,
    QueryPaymentResponse,
    RefundResponse,
};
use vpg_common::{Secret, Vnd};
use voucher_payment_engine::{
    db_types::{FormData, Order, OrderId, OrderStatus},
    traits::{SyncError, SyncSink},
};

use crate::config::GatewayAuth;

pub const TEST_ACCESS_KEY: &str = "F8BBA8";
pub const TEST_SECRET_KEY: &str = "at67qH6vzxr0chat";

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_payment(&self, order_id: &str, amount: Vnd, order_info: &str, extra_data: &str) -> Result<CreatePaymentResponse, MomoApiError>;
        async fn query_payment(&self, order_id: &str) -> Result<QueryPaymentResponse, MomoApiError>;
        async fn refund(&self, order_id: &str, trans_id: i64, amount: Vnd, description: &str) -> Result<RefundResponse, MomoApiError>;
    }
}

/// A sink that only counts; every forward succeeds.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub forwards: Arc<AtomicUsize>,
    pub refunds: Arc<AtomicUsize>,
}

impl SyncSink for RecordingSink {
    async fn forward(&self, _order: &Order) -> Result<(), SyncError> {
        self.forwards.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn forward_refund(&self, _order: &Order, _amount: Vnd, _tx_id: &str) -> Result<(), SyncError> {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn test_auth() -> GatewayAuth {
    GatewayAuth {
        access_key: TEST_ACCESS_KEY.to_string(),
        secret_key: Secret::new(TEST_SECRET_KEY.to_string()),
        skip_signature_check: false,
    }
}

pub fn test_secret() -> Secret<String> {
    Secret::new(TEST_SECRET_KEY.to_string())
}

pub fn sample_form() -> FormData {
    FormData {
        sender_name: Some("An".to_string()),
        sender_phone: Some("0903000001".to_string()),
        sender_email: Some("an@example.com".to_string()),
        recipient_name: Some("Bình".to_string()),
        recipient_phone: Some("0903000002".to_string()),
        recipient_email: Some("binh@example.com".to_string()),
        message: Some("Chúc mừng sinh nhật!".to_string()),
    }
}

pub fn paid_order(id: &str, amount: i64, tx_id: &str, form_data: Option<FormData>) -> Order {
    let now = Utc::now();
    Order {
        order_id: OrderId(id.to_string()),
        status: OrderStatus::Paid,
        amount: Some(Vnd::new(amount)),
        service_name: Some("Birthday card".to_string()),
        form_data,
        gateway_tx_id: Some(tx_id.to_string()),
        created_at: now,
        updated_at: now,
        synced_at: None,
    }
}
