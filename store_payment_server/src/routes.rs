//! Request handler definitions
//!
//! Define each route and its handler here. Handlers delegate to the engine APIs, which apply the visibility and role
//! rules themselves. The ACL middleware on admin routes is the first line of defence, not the only one.
//!
//! A note about performance:
//! Each worker thread processes its requests sequentially, so handlers must never block the current thread. Every
//! database and provider call here is async for that reason.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use serde_json::Value;
use store_payment_engine::{
    db_types::{OrderId, PaymentId, ProductId, Role, StoreId},
    order_objects::{NewOrderRequest, OrderQueryFilter},
    payment_objects::{ChargeParams, PaymentCreateRequest, PaymentQueryFilter, RefundRequest},
    provider::PaymentProvider,
    traits::{AccountManagement, InventoryManagement, PaymentGatewayDatabase},
    AccountApi,
    InventoryApi,
    OrderFlowApi,
    PaymentFlowApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{OrderListQuery, PaymentListQuery},
    errors::ServerError,
};

/// The currency given to orders that do not name one. Registered as app data by the server.
#[derive(Debug, Clone)]
pub struct DefaultCurrency(pub String);

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Each trait bound becomes a type parameter of the route, in the order given.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:path),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

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

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:path),*])  => {
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
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Parses a raw body into JSON. An empty body is `null`.
fn json_payload(body: &web::Bytes) -> Result<Value, ServerError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl PaymentGatewayDatabase);
/// Route handler for order creation
///
/// The order is created for the authenticated caller; the body cannot name another owner. Prices come from the
/// inventory of the caller's active store. Responds with `201 Created` and the order with its items.
pub async fn create_order<B: PaymentGatewayDatabase>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    currency: web::Data<DefaultCurrency>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create_order for {}", claims.username);
    let order = body.into_inner().into_new_order(claims.user_id(), &currency.0);
    let details = api.create_order(order).await.map_err(|e| {
        debug!("💻️ Could not create order. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(details))
}

route!(my_orders => Get "/orders" impl AccountManagement);
/// Route handler for the order listing
///
/// Regular users only ever see their own orders; an `owner_id` in the query is ignored for them. Administrators see
/// every order matching the query.
pub async fn my_orders<B: AccountManagement>(
    claims: JwtClaims,
    query: web::Query<OrderListQuery>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::try_from(query.into_inner())?;
    debug!("💻️ GET orders for {} [{filter}]", claims.username);
    let orders = api.orders_for(&claims.caller(), filter).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl PaymentGatewayDatabase);
/// Fetch a single order with its items. Orders belonging to someone else are reported as not found.
pub async fn order_by_id<B: PaymentGatewayDatabase>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id})");
    let details = api.fetch_order(order_id, &claims.caller()).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl PaymentGatewayDatabase where requires [Role::Admin]);
pub async fn cancel_order<B: PaymentGatewayDatabase>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST cancel_order({order_id}) by {}", claims.username);
    let order = api.cancel_order(order_id, &claims.caller()).await.map_err(|e| {
        debug!("💻️ Could not cancel order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(pay_order => Post "/orders/{order_id}/pay" impl PaymentGatewayDatabase, PaymentProvider where requires [Role::Admin]);
/// Charge an order's total.
///
/// The body is optional and may carry `currency`, `method`, `metadata` and `store_id`. A body containing `amount` is
/// rejected with 400 before anything else happens.
pub async fn pay_order<B: PaymentGatewayDatabase, P: PaymentProvider>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST pay_order({order_id}) by {}", claims.username);
    let params = ChargeParams::from_payload(json_payload(&body)?)?;
    let payment = api.charge(order_id, &claims.caller(), params).await.map_err(|e| {
        debug!("💻️ Could not charge order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(payment))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment => Post "/payments" impl PaymentGatewayDatabase, PaymentProvider);
/// Charge an order named in the body, `{order_id, currency?, method?, metadata?, store_id?}`.
///
/// Regular users may only charge orders they own. As with `/orders/{id}/pay`, `amount` is never accepted.
pub async fn create_payment<B: PaymentGatewayDatabase, P: PaymentProvider>(
    claims: JwtClaims,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let request = PaymentCreateRequest::from_payload(json_payload(&body)?)?;
    let order_id = request.order_id;
    debug!("💻️ POST create_payment for order {order_id} by {}", claims.username);
    let payment = api.charge(order_id, &claims.caller(), request.params).await.map_err(|e| {
        debug!("💻️ Could not charge order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(payment))
}

route!(my_payments => Get "/payments" impl AccountManagement);
pub async fn my_payments<B: AccountManagement>(
    claims: JwtClaims,
    query: web::Query<PaymentListQuery>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET payments for {}", claims.username);
    let filter = PaymentQueryFilter::try_from(query.into_inner())?;
    let payments = api.payments_for(&claims.caller(), filter).await.map_err(|e| {
        debug!("💻️ Could not fetch payments. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(payment_by_id => Get "/payments/{payment_id}" impl AccountManagement);
pub async fn payment_by_id<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<PaymentId>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ GET payment_by_id({payment_id})");
    let payment = api
        .payment_for(&claims.caller(), payment_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Payment {payment_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(refund_payment => Post "/payments/{payment_id}/refund" impl PaymentGatewayDatabase, PaymentProvider where requires [Role::Admin]);
/// Refund a successful payment. `{amount?}` defaults to the order total.
pub async fn refund_payment<B: PaymentGatewayDatabase, P: PaymentProvider>(
    claims: JwtClaims,
    path: web::Path<PaymentId>,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    let request = match json_payload(&body)? {
        Value::Null => RefundRequest::default(),
        v => serde_json::from_value::<RefundRequest>(v).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?,
    };
    debug!("💻️ POST refund_payment({payment_id}) by {}. Amount: {:?}", claims.username, request.amount);
    let payment = api.refund(payment_id, &claims.caller(), request.amount).await.map_err(|e| {
        debug!("💻️ Could not refund payment {payment_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(payment))
}

//----------------------------------------------   Inventory  ----------------------------------------------------
route!(inventory_price => Get "/stores/{store_id}/inventory/{product_id}" impl InventoryManagement);
pub async fn inventory_price<B: InventoryManagement>(
    path: web::Path<(StoreId, ProductId)>,
    api: web::Data<InventoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, product_id) = path.into_inner();
    debug!("💻️ GET inventory_price({store_id}, {product_id})");
    let price = api.price_for(store_id, product_id).await?.ok_or_else(|| {
        ServerError::NoRecordFound(format!("Product {product_id} is not stocked by store {store_id}"))
    })?;
    Ok(HttpResponse::Ok().json(price))
}
