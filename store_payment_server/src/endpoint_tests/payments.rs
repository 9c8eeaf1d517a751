use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use store_payment_engine::{
    db_types::{InventoryPrice, Money, OrderStatusType, PaymentStatus, ProductId, StoreId},
    payment_objects::PaymentScope,
    provider::SimulatedPaymentProvider,
    AccountApi,
    InventoryApi,
    PaymentFlowApi,
};

use super::{
    helpers::{
        account,
        admin_token,
        get_request,
        order,
        order_items,
        payment,
        post_request,
        user_token,
        ADMIN,
        ALICE,
        BOB,
    },
    mocks::{MockGatewayDb, MockInventoryManager},
};
use crate::routes::{
    CreatePaymentRoute,
    InventoryPriceRoute,
    MyPaymentsRoute,
    PayOrderRoute,
    PaymentByIdRoute,
    RefundPaymentRoute,
};

//----------------------------------------------   Charges  ----------------------------------------------------
#[actix_web::test]
async fn amounts_in_pay_requests_are_rejected_before_any_lookup() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"amount":"1.00","method":"cash"}"#;
    let (status, body) = post_request(&admin_token(), "/orders/1/pay", body, untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"The charge amount is derived from the order and may not be supplied by the client"}"#);
}

#[actix_web::test]
async fn pay_order_with_empty_body() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&admin_token(), "/orders/1/pay", "", configure).await;
    assert_eq!(status, StatusCode::CREATED);
    let payment: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["status"], "success");
    assert_eq!(payment["order_id"], 1);
    assert_eq!(payment["amount"], "25.00");
    assert_eq!(payment["method"], "card");
    assert_eq!(payment["payer"]["kind"], "user");
    assert_eq!(payment["items"].as_array().map(|a| a.len()), Some(2));
}

#[actix_web::test]
async fn regular_users_cannot_use_the_admin_pay_route() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(&user_token(ALICE), "/orders/1/pay", "", untouched_db).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn paying_a_paid_order_fails() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&admin_token(), "/orders/3/pay", "{}", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Order #3 has already been paid"}"#);
}

#[actix_web::test]
async fn malformed_pay_body() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(&admin_token(), "/orders/1/pay", "[1, 2]", untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_request(&admin_token(), "/orders/1/pay", "{not json", untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn amounts_in_payment_requests_are_rejected() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"order_id":1,"amount":"0.01"}"#;
    let (status, body) = post_request(&user_token(ALICE), "/payments", body, untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("may not be supplied by the client"));
}

#[actix_web::test]
async fn users_pay_their_own_orders() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"order_id":1,"method":"wallet"}"#;
    let (status, body) = post_request(&user_token(ALICE), "/payments", body, configure).await;
    assert_eq!(status, StatusCode::CREATED);
    let payment: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["method"], "wallet");
    assert_eq!(payment["payer"]["id"], 2);
}

#[actix_web::test]
async fn users_cannot_pay_for_orders_they_do_not_own() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(&user_token(BOB), "/payments", r#"{"order_id":1}"#, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn payment_requests_need_an_order() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(&user_token(ALICE), "/payments", r#"{"method":"card"}"#, untouched_db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//----------------------------------------------   Refunds  ----------------------------------------------------
#[actix_web::test]
async fn users_cannot_refund() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(&user_token(ALICE), "/payments/5/refund", "", untouched_db).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn refund_defaults_to_the_order_total() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&admin_token(), "/payments/5/refund", "", configure).await;
    assert_eq!(status, StatusCode::OK);
    let payment: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["status"], "refunded");
    assert_eq!(payment["refund_amount"], "25.00");
}

#[actix_web::test]
async fn refunds_larger_than_the_order_fail() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&admin_token(), "/payments/5/refund", r#"{"amount":"30.00"}"#, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid refund amount 30.00"));
}

#[actix_web::test]
async fn failed_payments_are_not_refundable() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&admin_token(), "/payments/6/refund", "{}", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payment #6 cannot be refunded because it is failed"}"#);
}

#[actix_web::test]
async fn payments_without_an_order_are_not_refundable() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&admin_token(), "/payments/7/refund", "", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payment #7 is not linked to an order"}"#);
}

#[actix_web::test]
async fn refunding_a_missing_payment() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(&admin_token(), "/payments/99/refund", "{}", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//----------------------------------------------   Queries  ----------------------------------------------------
#[actix_web::test]
async fn fetch_own_payment() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&user_token(ALICE), "/payments/5", configure).await;
    assert_eq!(status, StatusCode::OK);
    let payment: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["id"], 5);
    assert_eq!(payment["amount"], "25.00");
}

#[actix_web::test]
async fn other_users_payments_are_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(&user_token(BOB), "/payments/5", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn payment_listing_is_scoped_to_the_caller() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&user_token(ALICE), "/payments?status=success", configure).await;
    assert_eq!(status, StatusCode::OK);
    let payments: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["id"], 5);
}

//----------------------------------------------   Inventory  ----------------------------------------------------
#[actix_web::test]
async fn inventory_prices() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&user_token(ALICE), "/stores/1/inventory/10", configure_inventory).await;
    assert_eq!(status, StatusCode::OK);
    let price: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(price["unit_price"], "10.00");
    assert_eq!(price["quantity_available"], 40);

    let (status, _) = get_request(&user_token(ALICE), "/stores/1/inventory/99", configure_inventory).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn configure_inventory(cfg: &mut ServiceConfig) {
    let mut inventory = MockInventoryManager::new();
    inventory.expect_fetch_inventory_price().returning(|store_id, product_id| {
        Ok((product_id == ProductId(10)).then(|| InventoryPrice {
            store_id,
            product_id,
            product_name: "Widget".into(),
            sku: "W-1".into(),
            unit_price: Money::from_major(10),
            quantity_available: 40,
        }))
    });
    cfg.service(InventoryPriceRoute::<MockInventoryManager>::new()).app_data(web::Data::new(InventoryApi::new(inventory)));
}

fn untouched_db(cfg: &mut ServiceConfig) {
    register(cfg, MockGatewayDb::new(), MockGatewayDb::new());
}

fn configure(cfg: &mut ServiceConfig) {
    register(cfg, payments_db(), payments_db());
}

/// Order 1 belongs to Alice and is unpaid. Order 3 is paid. Payment 5 is Alice's successful payment for order 1, and
/// payment 6 a failed one. Payment 7 succeeded but its order has since been deleted.
fn payments_db() -> MockGatewayDb {
    let mut db = MockGatewayDb::new();
    db.expect_fetch_order().returning(|id| {
        Ok(match id.value() {
            1 => Some(order(1, ALICE)),
            3 => {
                let mut o = order(3, ALICE);
                o.is_paid = true;
                o.status = OrderStatusType::Processing;
                Some(o)
            },
            _ => None,
        })
    });
    db.expect_fetch_order_items().returning(|id| Ok(order_items(id.value())));
    db.expect_fetch_user_account().returning(|id| Ok(Some(account(id, id == ADMIN))));
    db.expect_record_payment().returning(|p| {
        let payer = p.payer.map(|b| b.id).unwrap_or_default();
        let mut recorded = payment(9, p.order_id.value(), payer.into(), p.status);
        recorded.method = p.method;
        recorded.provider_transaction_id = Some(p.provider_transaction_id);
        Ok(recorded)
    });
    db.expect_fetch_payment().returning(|id| {
        Ok(match id.value() {
            5 => Some(payment(5, 1, ALICE, PaymentStatus::Success)),
            6 => Some(payment(6, 1, ALICE, PaymentStatus::Failed)),
            7 => {
                let mut p = payment(7, 1, ALICE, PaymentStatus::Success);
                p.order_id = None;
                Some(p)
            },
            _ => None,
        })
    });
    db.expect_refund_payment().returning(|id, amount| {
        let mut refunded = payment(id.value(), 1, ALICE, PaymentStatus::Refunded);
        refunded.refund_amount = Some(amount);
        let mut o = order(1, ALICE);
        o.status = OrderStatusType::Refunded;
        Ok((refunded, o))
    });
    db.expect_search_payments()
        .withf(|q| {
            q.visible_to == Some(PaymentScope { user_id: ALICE, store_id: Some(StoreId(1)) }) &&
                q.status == Some(vec![PaymentStatus::Success])
        })
        .returning(|_| Ok(vec![payment(5, 1, ALICE, PaymentStatus::Success)]));
    db
}

fn register(cfg: &mut ServiceConfig, payments_db: MockGatewayDb, accounts_db: MockGatewayDb) {
    cfg.service(PayOrderRoute::<MockGatewayDb, SimulatedPaymentProvider>::new())
        .service(CreatePaymentRoute::<MockGatewayDb, SimulatedPaymentProvider>::new())
        .service(MyPaymentsRoute::<MockGatewayDb>::new())
        .service(PaymentByIdRoute::<MockGatewayDb>::new())
        .service(RefundPaymentRoute::<MockGatewayDb, SimulatedPaymentProvider>::new())
        .app_data(web::Data::new(PaymentFlowApi::new(payments_db, SimulatedPaymentProvider::new())))
        .app_data(web::Data::new(AccountApi::new(accounts_db)));
}
