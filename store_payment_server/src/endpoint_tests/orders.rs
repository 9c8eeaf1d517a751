use actix_web::{http::StatusCode, web, web::ServiceConfig};
use log::debug;
use serde_json::Value;
use store_payment_engine::{
    db_types::{OrderId, OrderStatusType},
    order_objects::OrderDetails,
    AccountApi,
    OrderFlowApi,
    PaymentGatewayError,
};

use super::{
    helpers::{admin_token, get_request, order, order_items, post_request, user_token, ALICE, BOB},
    mocks::MockGatewayDb,
};
use crate::routes::{CancelOrderRoute, CreateOrderRoute, DefaultCurrency, MyOrdersRoute, OrderByIdRoute};

#[actix_web::test]
async fn fetch_orders_without_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders", untouched_db).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Authentication Error. No access token was provided.");
}

#[actix_web::test]
async fn fetch_orders_with_tampered_token() {
    let _ = env_logger::try_init().ok();
    let mut token = user_token(ALICE);
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    debug!("Calling /orders with invalid token {token}");
    let (status, _) = get_request(&token, "/orders", untouched_db).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn users_only_see_their_own_orders() {
    let _ = env_logger::try_init().ok();
    // The mock only answers queries that are scoped to Alice
    let (status, body) = get_request(&user_token(ALICE), "/orders?owner_id=3&status=pending", configure).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["owner_id"], 2);
    assert_eq!(orders[0]["status"], "pending");
}

#[actix_web::test]
async fn invalid_status_filter() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&user_token(ALICE), "/orders?status=shipped", untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid OrderStatusType"));
}

#[actix_web::test]
async fn fetch_own_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&user_token(ALICE), "/orders/1", configure).await;
    assert_eq!(status, StatusCode::OK);
    let details: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(details["id"], 1);
    assert_eq!(details["items"].as_array().map(|a| a.len()), Some(2));
}

#[actix_web::test]
async fn another_users_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&user_token(BOB), "/orders/1", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The requested order #1 does not exist"}"#);
}

#[actix_web::test]
async fn admins_see_any_order() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(&admin_token(), "/orders/1", configure).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"items":[{"product_id":10,"quantity":2},{"product_id":11,"quantity":1}]}"#;
    let (status, body) = post_request(&user_token(ALICE), "/orders", body, configure).await;
    assert_eq!(status, StatusCode::CREATED);
    let details: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(details["owner_id"], 2);
    assert_eq!(details["currency"], "VND");
    assert_eq!(details["items"].as_array().map(|a| a.len()), Some(2));
}

#[actix_web::test]
async fn empty_orders_never_reach_the_database() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&user_token(ALICE), "/orders", r#"{"items":[]}"#, untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"An order must contain at least one item"}"#);
}

#[actix_web::test]
async fn zero_quantities_are_rejected() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"items":[{"product_id":10,"quantity":0}]}"#;
    let (status, _) = post_request(&user_token(ALICE), "/orders", body, untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_order_bodies_get_json_errors() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"items":[{"product_id":1}]}"#;
    let (status, body) = post_request(&user_token(ALICE), "/orders", body, untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: Value = serde_json::from_str(&body).unwrap();
    let msg = err["error"].as_str().unwrap();
    assert!(msg.starts_with("Could not read request body"), "{msg}");
    assert!(msg.contains("missing field `quantity`"), "{msg}");
}

#[actix_web::test]
async fn bad_query_strings_get_json_errors() {
    let _ = env_logger::try_init().ok();
    for path in ["/orders?is_paid=maybe", "/orders?colour=red"] {
        let (status, body) = get_request(&user_token(ALICE), path, untouched_db).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        let err: Value = serde_json::from_str(&body).unwrap();
        assert!(err["error"].as_str().unwrap().starts_with("Could not read request body"), "{path}: {body}");
    }
}

#[actix_web::test]
async fn non_numeric_order_ids_get_json_errors() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&user_token(ALICE), "/orders/abc", untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: Value = serde_json::from_str(&body).unwrap();
    assert!(err["error"].as_str().unwrap().starts_with("Could not read request body"), "{body}");
}

#[actix_web::test]
async fn users_cannot_cancel_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&user_token(ALICE), "/orders/1/cancel", "", untouched_db).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("admin"));
}

#[actix_web::test]
async fn admins_cancel_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&admin_token(), "/orders/1/cancel", "", configure).await;
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "cancelled");
}

#[actix_web::test]
async fn cancelling_a_refunded_order_fails() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&admin_token(), "/orders/2/cancel", "", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cannot move from refunded to cancelled"));
}

/// Registers the routes over a database mock with no expectations. Any database call fails the test.
fn untouched_db(cfg: &mut ServiceConfig) {
    register(cfg, MockGatewayDb::new(), MockGatewayDb::new());
}

fn configure(cfg: &mut ServiceConfig) {
    let mut orders_db = MockGatewayDb::new();
    orders_db.expect_fetch_order().returning(|id| Ok((id == OrderId(1)).then(|| order(1, ALICE))));
    orders_db.expect_fetch_order_items().returning(|id| Ok(order_items(id.value())));
    orders_db.expect_insert_order().returning(|new_order| {
        let mut o = order(7, new_order.owner_id);
        o.currency = new_order.currency.clone();
        Ok(OrderDetails { order: o, items: order_items(7) })
    });
    orders_db.expect_cancel_order().returning(|id| {
        if id == OrderId(2) {
            return Err(PaymentGatewayError::InvalidTransition {
                order_id: id,
                from: OrderStatusType::Refunded,
                to: OrderStatusType::Cancelled,
            });
        }
        let mut o = order(id.value(), ALICE);
        o.status = OrderStatusType::Cancelled;
        Ok(o)
    });

    let mut accounts_db = MockGatewayDb::new();
    accounts_db
        .expect_search_orders()
        .withf(|q| q.owner_id == Some(ALICE) && q.status == Some(vec![OrderStatusType::Pending]))
        .returning(|_| Ok(vec![order(1, ALICE)]));
    register(cfg, orders_db, accounts_db);
}

fn register(cfg: &mut ServiceConfig, orders_db: MockGatewayDb, accounts_db: MockGatewayDb) {
    cfg.service(CreateOrderRoute::<MockGatewayDb>::new())
        .service(MyOrdersRoute::<MockGatewayDb>::new())
        .service(OrderByIdRoute::<MockGatewayDb>::new())
        .service(CancelOrderRoute::<MockGatewayDb>::new())
        .app_data(web::Data::new(OrderFlowApi::new(orders_db)))
        .app_data(web::Data::new(AccountApi::new(accounts_db)))
        .app_data(web::Data::new(DefaultCurrency("VND".into())));
}
