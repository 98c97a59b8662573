use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use momo_gateway::MomoApi;
use voucher_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    ReconciliationApi,
    SqliteOrderStore,
};

use crate::{
    config::{GatewayAuth, ServerConfig},
    errors::ServerError,
    integrations::{Mailer, SheetSink},
    routes::{health, ClientSyncRoute, CreatePaymentRoute, MomoIpnRoute, OrderStatusRoute, RefundOrderRoute},
};

/// How many pending notification events may queue behind a slow mail relay.
const EVENT_BUFFER_SIZE: usize = 100;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = SqliteOrderStore::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mailer = Mailer::new(&config.mail)?;
    let mut hooks = EventHooks::default();
    hooks.on_order_synced(move |event| {
        let mailer = mailer.clone();
        Box::pin(async move {
            mailer.send_order_notifications(&event.order).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, store, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    store: SqliteOrderStore,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let momo = MomoApi::new(config.momo.clone())?;
    let sheet = SheetSink::new(config.sheet_webhook_url.clone())?;
    let auth = GatewayAuth::from_config(&config);
    let srv = HttpServer::new(move || {
        let api = ReconciliationApi::new(store.clone(), sheet.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("vpg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(momo.clone()))
            .app_data(web::Data::new(auth.clone()))
            .service(health)
            .service(CreatePaymentRoute::<SqliteOrderStore, SheetSink, MomoApi>::new())
            .service(MomoIpnRoute::<SqliteOrderStore, SheetSink>::new())
            .service(OrderStatusRoute::<SqliteOrderStore, SheetSink, MomoApi>::new())
            .service(ClientSyncRoute::<SqliteOrderStore, SheetSink>::new())
            .service(RefundOrderRoute::<SqliteOrderStore, SheetSink, MomoApi>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
