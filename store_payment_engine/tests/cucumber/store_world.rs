use cucumber::World;
use log::*;
use store_payment_engine::{
    db_types::{OrderId, PaymentId},
    test_utils::fixtures::{seeded_database, StoreFixture},
    AccountApi,
    Caller,
    OrderFlowApi,
    PaymentFlowApi,
    PaymentGatewayError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct StoreWorld {
    pub system: Option<StoreSystem>,
    pub last_order: Option<OrderId>,
    pub last_payment: Option<PaymentId>,
    pub last_error: Option<PaymentGatewayError>,
}

#[derive(Debug)]
pub struct StoreSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub fixture: StoreFixture,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentFlowApi<SqliteDatabase>,
    pub accounts: AccountApi<SqliteDatabase>,
}

impl StoreSystem {
    pub async fn new() -> Self {
        let (db_path, db, fixture) = seeded_database().await;
        debug!("🚀️ Created database: {db_path}");
        let orders = OrderFlowApi::new(db.clone());
        let payments = PaymentFlowApi::new(db.clone(), Default::default());
        let accounts = AccountApi::new(db.clone());
        Self { db_path, db, fixture, orders, payments, accounts }
    }
}

impl StoreWorld {
    pub fn system(&self) -> &StoreSystem {
        self.system.as_ref().expect("Store system not initialised")
    }

    /// Maps a name used in the feature files onto a fixture user.
    pub fn caller(&self, name: &str) -> Caller {
        let f = &self.system().fixture;
        match name {
            "admin" => Caller::admin(f.admin),
            "alice" => Caller::user(f.alice),
            "bob" => Caller::user(f.bob),
            "outsider" => Caller::user(f.outsider),
            other => panic!("Unknown user {other}"),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.last_order.expect("No order has been created")
    }

    pub fn payment_id(&self) -> PaymentId {
        self.last_payment.expect("No payment has been made")
    }
}
