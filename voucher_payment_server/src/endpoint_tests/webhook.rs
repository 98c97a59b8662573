use std::sync::atomic::Ordering;

use actix_web::{http::StatusCode, web};
use momo_gateway::IpnPayload;
use voucher_payment_engine::{
    db_types::{OrderId, OrderStatus},
    events::EventProducers,
    extra_data,
    traits::OrderStore,
    MemoryOrderStore,
    ReconciliationApi,
};

use super::{
    helpers::post_request,
    mocks::{sample_form, test_auth, test_secret, RecordingSink, TEST_ACCESS_KEY},
};
use crate::routes::MomoIpnRoute;

fn signed_ipn(order_id: &str, amount: i64, trans_id: i64, result_code: i64, extra_data: String) -> IpnPayload {
    let mut ipn = IpnPayload {
        partner_code: "MOMOV2".to_string(),
        order_id: order_id.to_string(),
        request_id: format!("{order_id}-1"),
        amount,
        order_info: "Gift voucher".to_string(),
        order_type: "momo_wallet".to_string(),
        trans_id,
        result_code,
        message: if result_code == 0 { "Successful.".to_string() } else { "Failed.".to_string() },
        pay_type: "qr".to_string(),
        response_time: 1_717_000_000_000,
        extra_data,
        signature: String::new(),
    };
    ipn.signature = ipn.compute_signature(TEST_ACCESS_KEY, &test_secret());
    ipn
}

fn ipn_app(
    store: &MemoryOrderStore,
    sink: &RecordingSink,
) -> impl FnOnce(&mut actix_web::web::ServiceConfig) {
    let api = ReconciliationApi::new(store.clone(), sink.clone(), EventProducers::default());
    move |cfg| {
        cfg.service(MomoIpnRoute::<MemoryOrderStore, RecordingSink>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(test_auth()));
    }
}

#[actix_web::test]
async fn paid_ipn_with_extra_data_settles_and_forwards() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let token = extra_data::encode(Some(&sample_form()), Some("Birthday card"));
    let ipn = signed_ipn("GC-1001", 200_000, 2_147_483_990, 0, token);
    let (status, body) = post_request("/payment/ipn", &ipn, ipn_app(&store, &sink)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("received"), "unexpected ack body: {body}");
    let order = store.fetch_order(&OrderId("GC-1001".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.amount.map(|a| a.value()), Some(200_000));
    assert_eq!(order.gateway_tx_id.as_deref(), Some("2147483990"));
    assert_eq!(order.form_data, Some(sample_form()));
    assert_eq!(order.service_name.as_deref(), Some("Birthday card"));
    assert!(order.synced_at.is_some());
    assert_eq!(sink.forwards.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn bad_signature_acks_but_leaves_the_order_untouched() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut ipn = signed_ipn("GC-1002", 200_000, 42, 0, String::new());
    ipn.signature = "0".repeat(64);
    let (status, body) = post_request("/payment/ipn", &ipn, ipn_app(&store, &sink)).await;
    // The gateway must stop retrying even though we refused the state change.
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("received"));
    assert!(store.fetch_order(&OrderId("GC-1002".to_string())).await.unwrap().is_none());
    assert_eq!(sink.forwards.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn tampered_amount_fails_verification() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let mut ipn = signed_ipn("GC-1003", 200_000, 42, 0, String::new());
    ipn.amount = 1;
    let (status, _) = post_request("/payment/ipn", &ipn, ipn_app(&store, &sink)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.fetch_order(&OrderId("GC-1003".to_string())).await.unwrap().is_none());
}

#[actix_web::test]
async fn failed_result_code_marks_the_order_failed() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let ipn = signed_ipn("GC-1004", 200_000, 0, 1006, String::new());
    let (status, _) = post_request("/payment/ipn", &ipn, ipn_app(&store, &sink)).await;
    assert_eq!(status, StatusCode::OK);
    let order = store.fetch_order(&OrderId("GC-1004".to_string())).await.unwrap().expect("order missing");
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(sink.forwards.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn redelivered_ipn_forwards_only_once() {
    let _ = env_logger::try_init();
    let store = MemoryOrderStore::new();
    let sink = RecordingSink::default();
    let token = extra_data::encode(Some(&sample_form()), None);
    let ipn = signed_ipn("GC-1005", 200_000, 77, 0, token);
    for _ in 0..3 {
        let (status, _) = post_request("/payment/ipn", &ipn, ipn_app(&store, &sink)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let order = store.fetch_order(&OrderId("GC-1005".to_string())).await.unwrap().expect("order missing");
    assert!(order.synced_at.is_some());
    assert_eq!(sink.forwards.load(Ordering::SeqCst), 1);
}
