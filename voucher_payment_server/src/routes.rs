//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate function. Keep this module
//! neat and tidy 🙏
//!
//! All five payment routes are thin translators: they validate and unpack the external request
//! shape, funnel it into the reconciliation engine, and shape the response. The engine owns every
//! rule about what an update is allowed to do; nothing in this module mutates an order directly.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use momo_gateway::{validate_refund_amount, IpnPayload, PaymentGateway, PaymentOutcome};
use vpg_common::Vnd;
use voucher_payment_engine::{
    db_types::{Channel, OrderId, OrderStatus, OrderUpdate},
    extra_data,
    traits::{OrderStore, SyncSink},
    ReconciliationApi,
};

use crate::{
    config::GatewayAuth,
    data_objects::{
        ClientSyncParams,
        CreatePaymentParams,
        CreatePaymentResult,
        JsonResponse,
        RefundParams,
        RefundResult,
        StatusQueryParams,
        StatusResult,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so routes are implemented manually using the
// `route!` macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Create payment   --------------------------------------------------
route!(create_payment => Post "/payment" impl OrderStore, SyncSink, PaymentGateway);
/// Register a payment intent and hand the buyer the gateway redirect URL.
///
/// The order intent (including whatever form data the client already has) is persisted *before*
/// the gateway call, so that a webhook racing ahead of the redirect still finds the record. A
/// zero amount is the free-voucher path: no gateway involved, the order settles as `FREE`
/// immediately.
pub async fn create_payment<B, S, G>(
    body: web::Json<CreatePaymentParams>,
    api: web::Data<ReconciliationApi<B, S>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    S: SyncSink,
    G: PaymentGateway,
{
    let params = body.into_inner();
    if params.order_id.trim().is_empty() {
        return Err(ServerError::ValidationError("orderId must not be empty".to_string()));
    }
    if params.amount < 0 {
        return Err(ServerError::ValidationError("amount must not be negative".to_string()));
    }
    let order_id = OrderId(params.order_id.clone());
    let free = params.amount == 0;
    let status = if free { OrderStatus::Free } else { OrderStatus::Pending };
    let mut update = OrderUpdate::new(order_id.clone(), status, Channel::ClientSync);
    if !free {
        update = update.with_amount(Vnd::new(params.amount));
    }
    if let Some(form_data) = params.form_data.clone() {
        update = update.with_form_data(form_data);
    }
    if let Some(service_name) = params.service_name.clone() {
        update = update.with_service_name(service_name);
    }
    let outcome = api.process_update(update).await?;
    if free {
        info!("💻️ Free voucher order {order_id} settled without a gateway call");
        let result = CreatePaymentResult {
            order_id: params.order_id,
            status: outcome.order.status,
            pay_url: None,
            deeplink: None,
        };
        return Ok(HttpResponse::Ok().json(result));
    }
    let token = extra_data::encode(params.form_data.as_ref(), params.service_name.as_deref());
    let order_info = params.service_name.clone().unwrap_or_else(|| "Voucher purchase".to_string());
    let response = gateway.create_payment(&params.order_id, Vnd::new(params.amount), &order_info, &token).await?;
    match response.outcome() {
        PaymentOutcome::Success => {
            info!("💻️ Payment for order {order_id} registered with the gateway");
            let result = CreatePaymentResult {
                order_id: params.order_id,
                status: outcome.order.status,
                pay_url: response.pay_url,
                deeplink: response.deeplink,
            };
            Ok(HttpResponse::Ok().json(result))
        },
        PaymentOutcome::Failed { code, message } => {
            warn!("💻️ Gateway refused to create payment for order {order_id}: {code} {message}");
            Err(ServerError::GatewayRejected(format!("{code}: {message}")))
        },
    }
}

//----------------------------------------------   IPN webhook   -----------------------------------------------------
route!(momo_ipn => Post "/payment/ipn" impl OrderStore, SyncSink);
/// The gateway's asynchronous server-to-server notification.
///
/// The response is always `200` with a small `received` body: the gateway treats anything else as
/// "retry", and neither a bad signature nor an internal failure is improved by being redelivered.
/// A bad signature refuses the state change but still acknowledges; storage trouble is swallowed
/// by the engine per its failure semantics.
pub async fn momo_ipn<B, S>(
    body: web::Json<IpnPayload>,
    api: web::Data<ReconciliationApi<B, S>>,
    auth: web::Data<GatewayAuth>,
) -> HttpResponse
where
    B: OrderStore,
    S: SyncSink,
{
    let ipn = body.into_inner();
    trace!("📨️ Received IPN for order {} with result code {}", ipn.order_id, ipn.result_code);
    if auth.skip_signature_check {
        warn!("📨️ Accepting IPN for order {} WITHOUT signature verification", ipn.order_id);
    } else if !ipn.verify_signature(&auth.access_key, &auth.secret_key) {
        error!(
            "🔐️ Invalid IPN signature for order {}. The state change is refused, but the callback is acknowledged \
             so the gateway stops retrying.",
            ipn.order_id
        );
        return HttpResponse::Ok().json(JsonResponse::received());
    }
    let order_id = OrderId(ipn.order_id.clone());
    let status = match ipn.outcome() {
        PaymentOutcome::Success => OrderStatus::Paid,
        PaymentOutcome::Failed { code, ref message } => {
            info!("📨️ Gateway reports order {order_id} failed: {code} {message}");
            OrderStatus::Failed
        },
    };
    let (form_data, service_name) = extra_data::decode(&ipn.extra_data);
    let mut update = OrderUpdate::new(order_id.clone(), status, Channel::Ipn).with_amount(Vnd::new(ipn.amount));
    if ipn.trans_id != 0 {
        update = update.with_gateway_tx_id(ipn.trans_id.to_string());
    }
    if let Some(form_data) = form_data {
        update = update.with_form_data(form_data);
    }
    if let Some(service_name) = service_name {
        update = update.with_service_name(service_name);
    }
    match api.process_update(update).await {
        Ok(outcome) => {
            info!("📨️ IPN for order {order_id} processed; order is {}", outcome.order.status);
        },
        Err(e) => {
            // Swallowed: the gateway must not retry on our internal trouble; the other channels
            // will bring the order back into reconciliation.
            warn!("📨️ Could not process IPN for order {order_id}: {e}");
        },
    }
    HttpResponse::Ok().json(JsonResponse::received())
}

//----------------------------------------------   Status query   ----------------------------------------------------
route!(order_status => Get "/payment/status" impl OrderStore, SyncSink, PaymentGateway);
/// The buyer's polling endpoint.
///
/// Asks the gateway first so a completed payment is picked up (and reconciled, and synced) even
/// when the IPN never arrived. If the gateway is unreachable the locally stored state is
/// returned instead; "we don't know yet" must never surface to the buyer as a failure.
pub async fn order_status<B, S, G>(
    query: web::Query<StatusQueryParams>,
    api: web::Data<ReconciliationApi<B, S>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    S: SyncSink,
    G: PaymentGateway,
{
    let params = query.into_inner();
    if params.order_id.trim().is_empty() {
        return Err(ServerError::ValidationError("orderId must not be empty".to_string()));
    }
    let order_id = OrderId(params.order_id.clone());
    trace!("💻️ Status query for order {order_id}");
    match gateway.query_payment(&params.order_id).await {
        Ok(response) => {
            let status = match response.outcome() {
                PaymentOutcome::Success => OrderStatus::Paid,
                PaymentOutcome::Failed { .. } => OrderStatus::Failed,
            };
            let (form_data, service_name) = extra_data::decode(&response.extra_data);
            let mut update = OrderUpdate::new(order_id.clone(), status, Channel::StatusPoll);
            if let Some(amount) = response.amount {
                update = update.with_amount(Vnd::new(amount));
            }
            if let Some(trans_id) = response.trans_id.filter(|t| *t != 0) {
                update = update.with_gateway_tx_id(trans_id.to_string());
            }
            if let Some(form_data) = form_data {
                update = update.with_form_data(form_data);
            }
            if let Some(service_name) = service_name {
                update = update.with_service_name(service_name);
            }
            match api.process_update(update).await {
                Ok(outcome) => Ok(HttpResponse::Ok().json(StatusResult::from_order(&outcome.order, &response.message))),
                Err(e) => {
                    // The gateway answered but our storage did not; report the gateway's view.
                    warn!("💻️ Could not reconcile status query for order {order_id}: {e}");
                    let result = StatusResult {
                        order_id: params.order_id,
                        status,
                        amount: response.amount,
                        trans_id: response.trans_id.filter(|t| *t != 0).map(|t| t.to_string()),
                        message: response.message,
                    };
                    Ok(HttpResponse::Ok().json(result))
                },
            }
        },
        Err(e) => {
            warn!("💻️ Gateway unreachable for status query on order {order_id}: {e}. Falling back to local state.");
            match api.store().fetch_order(&order_id).await {
                Ok(Some(order)) => {
                    Ok(HttpResponse::Ok().json(StatusResult::from_order(&order, "Gateway unreachable; returning last known state")))
                },
                Ok(None) => {
                    let result = StatusResult {
                        order_id: params.order_id,
                        status: OrderStatus::Pending,
                        amount: None,
                        trans_id: None,
                        message: "Payment is still pending confirmation".to_string(),
                    };
                    Ok(HttpResponse::Ok().json(result))
                },
                Err(e) => Err(ServerError::BackendError(e.to_string())),
            }
        },
    }
}

//----------------------------------------------   Client sync   -----------------------------------------------------
route!(client_sync => Post "/payment/sync" impl OrderStore, SyncSink);
/// The client's "I just paid" reconciliation call.
///
/// This is the only channel that reliably carries the buyer's form data (the gateway neither
/// stores nor returns it beyond the size-capped token), so `formData` is required here. The
/// reported status defaults to `PAID`; the gateway channels confirm or correct it.
pub async fn client_sync<B, S>(
    body: web::Json<ClientSyncParams>,
    api: web::Data<ReconciliationApi<B, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    S: SyncSink,
{
    let params = body.into_inner();
    if params.order_id.trim().is_empty() {
        return Err(ServerError::ValidationError("orderId must not be empty".to_string()));
    }
    let mut form_data = params.form_data;
    if form_data.message.is_none() {
        form_data.message = params.message.clone().filter(|m| !m.is_empty());
    }
    if form_data.is_empty() {
        return Err(ServerError::ValidationError("formData must not be empty".to_string()));
    }
    let status = params.status.unwrap_or(OrderStatus::Paid);
    if status.is_refund() {
        return Err(ServerError::ValidationError("Clients cannot report refunds".to_string()));
    }
    let order_id = OrderId(params.order_id.clone());
    let mut update = OrderUpdate::new(order_id.clone(), status, Channel::ClientSync).with_form_data(form_data);
    if let Some(amount) = params.amount {
        update = update.with_amount(Vnd::new(amount));
    }
    if let Some(trans_id) = params.trans_id.filter(|t| !t.is_empty()) {
        update = update.with_gateway_tx_id(trans_id);
    }
    if let Some(service_name) = params.service_name.filter(|s| !s.is_empty()) {
        update = update.with_service_name(service_name);
    }
    let outcome = api.process_update(update).await?;
    debug!("💻️ Client sync for order {order_id} processed; order is {}", outcome.order.status);
    Ok(HttpResponse::Ok().json(StatusResult::from_order(&outcome.order, "Order synchronized")))
}

//----------------------------------------------   Refund   ----------------------------------------------------------
route!(refund_order => Post "/payment/refund" impl OrderStore, SyncSink, PaymentGateway);
/// Operator-initiated refund of a settled payment.
///
/// Every validation (amount bounds, order state, amount vs. the originally paid amount) happens
/// before the signed gateway call is placed; a rejected refund must leave no trace anywhere.
pub async fn refund_order<B, S, G>(
    body: web::Json<RefundParams>,
    api: web::Data<ReconciliationApi<B, S>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    S: SyncSink,
    G: PaymentGateway,
{
    let params = body.into_inner();
    if params.order_id.trim().is_empty() {
        return Err(ServerError::ValidationError("orderId must not be empty".to_string()));
    }
    let amount = Vnd::new(params.amount);
    validate_refund_amount(amount)?;
    let order_id = OrderId(params.order_id.clone());
    let order = api
        .store()
        .fetch_order(&order_id)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist.")))?;
    if order.status != OrderStatus::Paid && order.status != OrderStatus::PartiallyRefunded {
        return Err(ServerError::BusinessRuleViolation(format!(
            "Order {order_id} is {} and cannot be refunded",
            order.status
        )));
    }
    let paid = order
        .amount
        .ok_or_else(|| ServerError::BusinessRuleViolation(format!("The paid amount for {order_id} is not known")))?;
    if amount > paid {
        return Err(ServerError::BusinessRuleViolation(format!(
            "Refund of {amount} exceeds the paid amount of {paid}"
        )));
    }
    let description = params.description.unwrap_or_default();
    let response = gateway.refund(&params.order_id, params.trans_id, amount, &description).await?;
    match response.outcome() {
        PaymentOutcome::Success => {
            let refund_tx_id = response.trans_id.map(|t| t.to_string()).unwrap_or_default();
            let order = api.record_refund(&order_id, amount, &refund_tx_id).await?;
            info!("💻️ Refund of {amount} for order {order_id} completed; order is {}", order.status);
            let result = RefundResult {
                order_id: params.order_id,
                status: order.status,
                refund_trans_id: response.trans_id.map(|t| t.to_string()),
            };
            Ok(HttpResponse::Ok().json(result))
        },
        PaymentOutcome::Failed { code, message } => {
            warn!("💻️ Gateway refused refund for order {order_id}: {code} {message}");
            Err(ServerError::GatewayRejected(format!("{code}: {message}")))
        },
    }
}
