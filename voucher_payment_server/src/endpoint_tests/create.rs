use std::sync::atomic::Ordering;

use actix_web::{http::StatusCode, web};
use momo_gateway::CreatePaymentResponse;
use voucher_payment_engine::{
    db_types::{OrderId, OrderStatus},
    events::EventProducers,
    traits::OrderStore,
    MemoryOrderStore,
    ReconciliationApi,
};

use super::{
    helpers::post_request,
    mocks::{sample_form, test_auth, MockGateway, RecordingSink},
};
use crate::{data_objects::CreatePaymentParams, routes::CreatePaymentRoute};

fn create_app(
    store: &MemoryOrderStore,
    sink: &RecordingSink,
    gateway: MockGateway,
) -> impl FnOnce(&mut actix_web::web::ServiceConfig) {
    let api = ReconciliationApi::new(store.clone(), sink.clone(), EventProducers::default());
    move |cfg| {
        cfg.service(CreatePaymentRoute::<MemoryOrderStore, RecordingSink, MockGateway>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(test_auth()));
    }
}

#[actix_web::test]
async fn create_registers_the_intent_and_returns_the_redirect() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment().times(1).returning(|_, _, _, _| {
        Ok(CreatePaymentResponse {
            result_code: 0,
            message: "Successful.".to_string(),
            pay_url: Some("https://payment.momo.vn/pay/abc".to_string()),
            deeplink: Some("momo://app?...".to_string()),
            qr_code_url: None,
            response_time: Some(1_717_000_000_000),
        })
    });
    let params = CreatePaymentParams {
        order_id: "GC-5001".to_string(),
        amount: 200_000,
        form_data: Some(sample_form()),
        service_name: Some("Birthday card".to_string()),
    };
    let (status, body) = post_request("/payment", &params, create_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("https://payment.momo.vn/pay/abc"), "unexpected body: {body}");
    // The intent is on record before the buyer ever reaches the gateway.
    let order = store.fetch_order(&OrderId("GC-5001".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.amount.map(|a| a.value()), Some(200_000));
    assert_eq!(order.form_data, Some(sample_form()));
    assert_eq!(sink.forwards.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn zero_amount_settles_as_free_without_a_gateway_call() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment().times(0);
    let params = CreatePaymentParams {
        order_id: "GC-5002".to_string(),
        amount: 0,
        form_data: Some(sample_form()),
        service_name: Some("Free e-card".to_string()),
    };
    let (status, body) = post_request("/payment", &params, create_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"FREE\""), "unexpected body: {body}");
    let order = store.fetch_order(&OrderId("GC-5002".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Free);
    assert!(order.synced_at.is_some());
    assert_eq!(sink.forwards.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn negative_amounts_are_rejected() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment().times(0);
    let params = CreatePaymentParams {
        order_id: "GC-5003".to_string(),
        amount: -1,
        form_data: None,
        service_name: None,
    };
    let (status, _) = post_request("/payment", &params, create_app(&store, &sink, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.fetch_order(&OrderId("GC-5003".to_string())).await.unwrap().is_none());
}
