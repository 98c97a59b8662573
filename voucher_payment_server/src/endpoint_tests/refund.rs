use std::sync::atomic::Ordering;

use actix_web::{http::StatusCode, web};
use momo_gateway::RefundResponse;
use voucher_payment_engine::{
    db_types::{Order, OrderId, OrderStatus},
    events::EventProducers,
    traits::OrderStore,
    MemoryOrderStore,
    ReconciliationApi,
};

use super::{
    helpers::post_request,
    mocks::{paid_order, sample_form, test_auth, MockGateway, RecordingSink},
};
use crate::{data_objects::RefundParams, routes::RefundOrderRoute};

fn refund_app(
    store: &MemoryOrderStore,
    sink: &RecordingSink,
    gateway: MockGateway,
) -> impl FnOnce(&mut actix_web::web::ServiceConfig) {
    let api = ReconciliationApi::new(store.clone(), sink.clone(), EventProducers::default());
    move |cfg| {
        cfg.service(RefundOrderRoute::<MemoryOrderStore, RecordingSink, MockGateway>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(test_auth()));
    }
}

fn refund_params(order_id: &str, amount: i64) -> RefundParams {
    RefundParams { order_id: order_id.to_string(), trans_id: 1_000_003, amount, description: None }
}

#[actix_web::test]
async fn refund_exceeding_the_paid_amount_never_reaches_the_gateway() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    store.upsert_order(&paid_order("GC-4001", 200_000, "1000003", Some(sample_form()))).await.unwrap();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(0);
    let (status, body) =
        post_request("/payment/refund", &refund_params("GC-4001", 300_000), refund_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("exceeds"), "unexpected body: {body}");
    let order = store.fetch_order(&OrderId("GC-4001".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Paid);
}

#[actix_web::test]
async fn out_of_bounds_amounts_are_rejected_before_any_lookup() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(0);
    let (status, _) =
        post_request("/payment/refund", &refund_params("GC-4002", 500), refund_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let store = MemoryOrderStore::new();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(0);
    let (status, _) = post_request(
        "/payment/refund",
        &refund_params("GC-4002", 60_000_000),
        refund_app(&store, &sink, gateway),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn refunding_an_unpaid_order_is_a_business_rule_violation() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    store.upsert_order(&Order::pending(OrderId("GC-4003".to_string()))).await.unwrap();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(0);
    let (status, _) =
        post_request("/payment/refund", &refund_params("GC-4003", 50_000), refund_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn refunding_an_unknown_order_is_not_found() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(0);
    let (status, _) =
        post_request("/payment/refund", &refund_params("GC-4004", 50_000), refund_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn full_refund_marks_the_order_refunded_and_forwards_a_record() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    store.upsert_order(&paid_order("GC-4005", 200_000, "1000003", Some(sample_form()))).await.unwrap();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(1).returning(|_, _, _, _| {
        Ok(RefundResponse {
            result_code: 0,
            message: "Successful.".to_string(),
            trans_id: Some(2_000_001),
            response_time: None,
        })
    });
    let (status, body) =
        post_request("/payment/refund", &refund_params("GC-4005", 200_000), refund_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"REFUNDED\""), "unexpected body: {body}");
    let order = store.fetch_order(&OrderId("GC-4005".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Refunded);
    assert_eq!(sink.refunds.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn partial_refund_keeps_its_own_status() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    store.upsert_order(&paid_order("GC-4006", 200_000, "1000003", Some(sample_form()))).await.unwrap();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(1).returning(|_, _, _, _| {
        Ok(RefundResponse {
            result_code: 0,
            message: "Successful.".to_string(),
            trans_id: Some(2_000_002),
            response_time: None,
        })
    });
    let (status, body) =
        post_request("/payment/refund", &refund_params("GC-4006", 50_000), refund_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"PARTIALLY_REFUNDED\""), "unexpected body: {body}");
    let order = store.fetch_order(&OrderId("GC-4006".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::PartiallyRefunded);
}
