use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use store_payment_engine::{
    provider::SimulatedPaymentProvider,
    AccountApi,
    InventoryApi,
    OrderFlowApi,
    PaymentFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::{configure_extractor_errors, ServerError},
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        CancelOrderRoute,
        CreateOrderRoute,
        CreatePaymentRoute,
        DefaultCurrency,
        InventoryPriceRoute,
        MyOrdersRoute,
        MyPaymentsRoute,
        OrderByIdRoute,
        PayOrderRoute,
        PaymentByIdRoute,
        RefundPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
        info!("🚀️ Database migrations are up to date");
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let payments_api = PaymentFlowApi::new(db.clone(), SimulatedPaymentProvider::new());
        let accounts_api = AccountApi::new(db.clone());
        let inventory_api = InventoryApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(inventory_api))
            .app_data(web::Data::new(DefaultCurrency(config.default_currency.clone())))
            .configure(configure_extractor_errors);
        // Every /api route requires a valid access token
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(config.auth.jwt_secret.clone()))
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(PayOrderRoute::<SqliteDatabase, SimulatedPaymentProvider>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, SimulatedPaymentProvider>::new())
            .service(MyPaymentsRoute::<SqliteDatabase>::new())
            .service(PaymentByIdRoute::<SqliteDatabase>::new())
            .service(RefundPaymentRoute::<SqliteDatabase, SimulatedPaymentProvider>::new())
            .service(InventoryPriceRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
