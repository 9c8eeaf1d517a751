use actix_web::{
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{Duration, TimeZone, Utc};
use log::debug;
use serde_json::json;
use spg_common::Secret;
use store_payment_engine::db_types::{
    BillingParty,
    Json,
    Money,
    Order,
    OrderId,
    OrderItem,
    OrderItemId,
    OrderStatusType,
    Payment,
    PaymentId,
    PaymentMethod,
    PaymentStatus,
    ProductId,
    StoreId,
    UserAccount,
    UserId,
};

use crate::{auth::TokenIssuer, config::AuthConfig, errors::configure_extractor_errors, middleware::JwtMiddlewareFactory};

// Only ever used to sign tokens in these tests. DO NOT re-use it anywhere.
pub const TEST_SECRET: &str = "endpoint-tests-secret-do-not-reuse";

pub const ADMIN: UserId = UserId(1);
pub const ALICE: UserId = UserId(2);
pub const BOB: UserId = UserId(3);

pub fn account(id: UserId, is_admin: bool) -> UserAccount {
    UserAccount {
        id,
        username: format!("user{}", id.value()),
        is_admin,
        store_id: Some(StoreId(1)),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    }
}

pub fn issue_token(account: &UserAccount) -> String {
    let config = AuthConfig::new(TEST_SECRET, Duration::hours(1));
    TokenIssuer::new(&config).issue_token(account, None).expect("Could not issue token")
}

pub fn admin_token() -> String {
    issue_token(&account(ADMIN, true))
}

pub fn user_token(id: UserId) -> String {
    issue_token(&account(id, false))
}

/// A pending, unpaid order for 25.00 owned by `owner`.
pub fn order(id: i64, owner: UserId) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap();
    Order {
        id: OrderId(id),
        owner_id: Some(owner),
        store_id: Some(StoreId(1)),
        status: OrderStatusType::Pending,
        total_amount: Money::from_major(25),
        currency: "VND".into(),
        shipping_address: None,
        is_paid: false,
        metadata: Json(json!({})),
        created_at: ts,
        updated_at: ts,
    }
}

pub fn order_items(order_id: i64) -> Vec<OrderItem> {
    vec![
        OrderItem {
            id: OrderItemId(1),
            order_id: OrderId(order_id),
            product_id: Some(ProductId(10)),
            product_name: "Widget".into(),
            sku: "W-1".into(),
            quantity: 2,
            unit_price: Money::from_major(10),
            line_total: Money::from_major(20),
        },
        OrderItem {
            id: OrderItemId(2),
            order_id: OrderId(order_id),
            product_id: Some(ProductId(11)),
            product_name: "Gadget".into(),
            sku: "G-1".into(),
            quantity: 1,
            unit_price: Money::from_major(5),
            line_total: Money::from_major(5),
        },
    ]
}

pub fn payment(id: i64, order_id: i64, payer: UserId, status: PaymentStatus) -> Payment {
    Payment {
        id: PaymentId(id),
        order_id: Some(OrderId(order_id)),
        payer: Some(BillingParty::user(payer)),
        currency: "VND".into(),
        method: PaymentMethod::Card,
        provider_transaction_id: Some(format!("SIM-1710527400000-user-{}-{order_id}", payer.value())),
        status,
        processed_at: Some(Utc.with_ymd_and_hms(2024, 3, 15, 18, 31, 0).unwrap()),
        refund_amount: None,
        metadata: Json(json!({})),
        created_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 31, 0).unwrap(),
    }
}

/// Sends `req` through the access token middleware and the routes set up by `configure`.
///
/// Errors raised by middleware never become responses in the test harness, so they are mapped to their status and
/// message here. Handler errors arrive as ordinary JSON error responses.
pub async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let scope = web::scope("").wrap(JwtMiddlewareFactory::new(Secret::new(TEST_SECRET.to_string()))).configure(configure);
    let app = App::new().configure(configure_extractor_errors).service(scope);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

fn with_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header(("Authorization", format!("Bearer {token}")))
    }
}

pub async fn get_request(token: &str, path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = with_token(TestRequest::get().uri(path), token);
    send_request(req, configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = with_token(TestRequest::post().uri(path), token).insert_header(ContentType::json()).set_payload(body.to_string());
    send_request(req, configure).await
}
