use cucumber::{then, when};
use store_payment_engine::{
    db_types::{Money, NewOrder, NewOrderItem, OrderStatusType, PaymentStatus, ProductId},
    order_objects::OrderQueryFilter,
    payment_objects::ChargeParams,
    AccountManagement,
};

use crate::cucumber::StoreWorld;

fn product(world: &StoreWorld, name: &str) -> ProductId {
    let f = &world.system().fixture;
    match name {
        "A" => f.product_a,
        "B" => f.product_b,
        "C" => f.product_c,
        other => panic!("Unknown product {other}"),
    }
}

fn money(s: &str) -> Money {
    s.parse().expect("Not a valid amount")
}

async fn place_order(world: &mut StoreWorld, user: &str, items: Vec<NewOrderItem>) {
    let owner = world.caller(user).user_id;
    let order = NewOrder::new(owner, items);
    let result = world.system().orders.create_order(order).await;
    match result {
        Ok(details) => {
            world.last_order = Some(details.order.id);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "{word} orders {int} of product {word}")]
async fn order_one_line(world: &mut StoreWorld, user: String, qty: i64, p: String) {
    let items = vec![NewOrderItem::new(product(world, &p), qty)];
    place_order(world, &user, items).await;
}

#[when(expr = "{word} orders {int} of product {word} and {int} of product {word}")]
async fn order_two_lines(world: &mut StoreWorld, user: String, qty1: i64, p1: String, qty2: i64, p2: String) {
    let items = vec![NewOrderItem::new(product(world, &p1), qty1), NewOrderItem::new(product(world, &p2), qty2)];
    place_order(world, &user, items).await;
}

#[when(expr = "{word} pays for the order")]
async fn pay_for_order(world: &mut StoreWorld, user: String) {
    let caller = world.caller(&user);
    let order_id = world.order_id();
    let result = world.system().payments.charge(order_id, &caller, ChargeParams::default()).await;
    match result {
        Ok(payment) => {
            world.last_payment = Some(payment.payment.id);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e),
    }
}

async fn refund(world: &mut StoreWorld, user: &str, amount: Option<Money>) {
    let caller = world.caller(user);
    let payment_id = world.payment_id();
    let result = world.system().payments.refund(payment_id, &caller, amount).await;
    match result {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "{word} refunds the payment")]
async fn refund_in_full(world: &mut StoreWorld, user: String) {
    refund(world, &user, None).await;
}

#[when(expr = "{word} refunds {word} of the payment")]
async fn refund_amount(world: &mut StoreWorld, user: String, amount: String) {
    refund(world, &user, Some(money(&amount))).await;
}

#[when(expr = "{word} cancels the order")]
async fn cancel_order(world: &mut StoreWorld, user: String) {
    let caller = world.caller(&user);
    let order_id = world.order_id();
    let result = world.system().orders.cancel_order(order_id, &caller).await;
    match result {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "{word} looks up the order")]
async fn look_up_order(world: &mut StoreWorld, user: String) {
    let caller = world.caller(&user);
    let order_id = world.order_id();
    let result = world.system().orders.fetch_order(order_id, &caller).await;
    match result {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e),
    }
}

#[then(expr = "the request fails with {word}")]
async fn request_fails(world: &mut StoreWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last request did not fail");
    let debug = format!("{err:?}");
    assert!(debug.starts_with(&kind), "Expected {kind}, but got {debug}");
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut StoreWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

#[then(expr = "the order total is {word}")]
async fn order_total(world: &mut StoreWorld, total: String) {
    let order = world.system().db.fetch_order(world.order_id()).await.unwrap().expect("Order not found");
    assert_eq!(order.total_amount, money(&total));
}

#[then(expr = "the order status is {word}")]
async fn order_status(world: &mut StoreWorld, status: String) {
    let order = world.system().db.fetch_order(world.order_id()).await.unwrap().expect("Order not found");
    assert_eq!(order.status, status.parse::<OrderStatusType>().unwrap());
}

#[then("the order is paid")]
async fn order_is_paid(world: &mut StoreWorld) {
    let order = world.system().db.fetch_order(world.order_id()).await.unwrap().expect("Order not found");
    assert!(order.is_paid);
}

#[then("the order is not paid")]
async fn order_is_not_paid(world: &mut StoreWorld) {
    let order = world.system().db.fetch_order(world.order_id()).await.unwrap().expect("Order not found");
    assert!(!order.is_paid);
}

#[then(expr = "the order has {int} item(s)")]
async fn order_item_count(world: &mut StoreWorld, count: usize) {
    let items = world.system().db.fetch_order_items(world.order_id()).await.unwrap();
    assert_eq!(items.len(), count);
}

#[then(expr = "the order has {int} payment(s)")]
async fn order_payment_count(world: &mut StoreWorld, count: usize) {
    let payments = world.system().db.fetch_payments_for_order(world.order_id()).await.unwrap();
    assert_eq!(payments.len(), count);
}

#[then(expr = "the payment status is {word}")]
async fn payment_status(world: &mut StoreWorld, status: String) {
    let payment = world.system().db.fetch_payment(world.payment_id()).await.unwrap().expect("Payment not found");
    assert_eq!(payment.status, status.parse::<PaymentStatus>().unwrap());
}

#[then(expr = "{word} sees the payment amount as {word}")]
async fn payment_amount(world: &mut StoreWorld, user: String, amount: String) {
    let caller = world.caller(&user);
    let payment = world
        .system()
        .accounts
        .payment_for(&caller, world.payment_id())
        .await
        .unwrap()
        .expect("Payment is not visible");
    assert_eq!(payment.amount, Some(money(&amount)));
}

#[then(expr = "the refund amount is {word}")]
async fn refund_amount_recorded(world: &mut StoreWorld, amount: String) {
    let payment = world.system().db.fetch_payment(world.payment_id()).await.unwrap().expect("Payment not found");
    assert_eq!(payment.refund_amount, Some(money(&amount)));
}

#[then(expr = "{word} can see {int} order(s)")]
async fn visible_orders(world: &mut StoreWorld, user: String, count: usize) {
    let caller = world.caller(&user);
    let orders = world.system().accounts.orders_for(&caller, OrderQueryFilter::default()).await.unwrap();
    assert_eq!(orders.len(), count);
}
