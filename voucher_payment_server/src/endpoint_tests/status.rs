use std::sync::atomic::Ordering;

use actix_web::{http::StatusCode, web};
use momo_gateway::{MomoApiError, QueryPaymentResponse};
use voucher_payment_engine::{
    db_types::{OrderId, OrderStatus},
    events::EventProducers,
    extra_data,
    traits::OrderStore,
    MemoryOrderStore,
    ReconciliationApi,
};

use super::{
    helpers::get_request,
    mocks::{paid_order, sample_form, test_auth, MockGateway, RecordingSink},
};
use crate::routes::OrderStatusRoute;

fn status_app(
    store: &MemoryOrderStore,
    sink: &RecordingSink,
    gateway: MockGateway,
) -> impl FnOnce(&mut actix_web::web::ServiceConfig) {
    let api = ReconciliationApi::new(store.clone(), sink.clone(), EventProducers::default());
    move |cfg| {
        cfg.service(OrderStatusRoute::<MemoryOrderStore, RecordingSink, MockGateway>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(test_auth()));
    }
}

#[actix_web::test]
async fn successful_query_reconciles_and_forwards() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let token = extra_data::encode(Some(&sample_form()), Some("Birthday card"));
    let mut gateway = MockGateway::new();
    gateway.expect_query_payment().returning(move |_| {
        Ok(QueryPaymentResponse {
            result_code: 0,
            message: "Successful.".to_string(),
            amount: Some(200_000),
            trans_id: Some(1_000_002),
            extra_data: token.clone(),
            pay_type: "qr".to_string(),
            response_time: Some(1_717_000_000_000),
        })
    });
    let (status, body) =
        get_request("/payment/status?orderId=GC-3001", status_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"PAID\""), "unexpected body: {body}");
    assert!(body.contains("\"transId\":\"1000002\""), "unexpected body: {body}");
    let order = store.fetch_order(&OrderId("GC-3001".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.form_data, Some(sample_form()));
    assert!(order.synced_at.is_some());
    assert_eq!(sink.forwards.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn explicit_failure_code_marks_the_order_failed() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_query_payment().returning(|_| {
        Ok(QueryPaymentResponse {
            result_code: 1006,
            message: "Transaction denied by user.".to_string(),
            amount: None,
            trans_id: None,
            extra_data: String::new(),
            pay_type: String::new(),
            response_time: None,
        })
    });
    let (status, body) =
        get_request("/payment/status?orderId=GC-3002", status_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"FAILED\""), "unexpected body: {body}");
    let order = store.fetch_order(&OrderId("GC-3002".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Failed);
}

#[actix_web::test]
async fn unreachable_gateway_falls_back_to_the_local_record() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    store.upsert_order(&paid_order("GC-3003", 200_000, "T1", Some(sample_form()))).await.unwrap();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway
        .expect_query_payment()
        .returning(|_| Err(MomoApiError::Unreachable("connection timed out".to_string())));
    let (status, body) =
        get_request("/payment/status?orderId=GC-3003", status_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    // A transport error is "unknown", never FAILED: the stored state wins.
    assert!(body.contains("\"status\":\"PAID\""), "unexpected body: {body}");
    let order = store.fetch_order(&OrderId("GC-3003".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Paid);
}

#[actix_web::test]
async fn unknown_order_with_unreachable_gateway_reads_as_pending() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway
        .expect_query_payment()
        .returning(|_| Err(MomoApiError::Unreachable("connection refused".to_string())));
    let (status, body) =
        get_request("/payment/status?orderId=GC-3004", status_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"PENDING\""), "unexpected body: {body}");
}
