use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use serde::Serialize;

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri(path).to_request();
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub async fn post_request<B, F>(path: &str, body: &B, configure: F) -> (StatusCode, String)
where
    B: Serialize,
    F: FnOnce(&mut ServiceConfig),
{
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri(path).set_json(body).to_request();
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
