use mockall::mock;
use store_payment_engine::{
    db_types::{
        InventoryPrice,
        Money,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderItem,
        Payment,
        PaymentId,
        ProductId,
        Store,
        StoreId,
        UserAccount,
        UserId,
    },
    order_objects::{OrderDetails, OrderQueryFilter},
    payment_objects::PaymentQueryFilter,
    traits::{
        AccountApiError,
        AccountManagement,
        InventoryApiError,
        InventoryManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
    },
};

mock! {
    pub GatewayDb {}
    impl AccountManagement for GatewayDb {
        async fn fetch_user_account(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountApiError>;
        async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, AccountApiError>;
        async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, AccountApiError>;
        async fn fetch_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, AccountApiError>;
        async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, AccountApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError>;
        async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, AccountApiError>;
    }
    impl PaymentGatewayDatabase for GatewayDb {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<OrderDetails, PaymentGatewayError>;
        async fn record_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError>;
        async fn refund_payment(&self, payment_id: PaymentId, amount: Money) -> Result<(Payment, Order), PaymentGatewayError>;
        async fn cancel_order(&self, order_id: OrderId) -> Result<Order, PaymentGatewayError>;
    }
}

mock! {
    pub InventoryManager {}
    impl InventoryManagement for InventoryManager {
        async fn fetch_active_store_for_user(&self, user_id: UserId) -> Result<Option<Store>, InventoryApiError>;
        async fn fetch_inventory_price(&self, store_id: StoreId, product_id: ProductId) -> Result<Option<InventoryPrice>, InventoryApiError>;
    }
}
