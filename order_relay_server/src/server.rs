use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use order_relay_engine::{
    events::{event_pipeline, EventProducer},
    OrderReconciler,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::HmacMiddlewareFactory,
    routes::{health, OrderByIdRoute, UnfulfilledOrdersRoute},
    shopify_routes::shopify_webhook,
};

/// The header Shopify uses to deliver the webhook signature.
pub const SHOPIFY_HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    SqliteDatabase::create_database_if_missing(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let (producer, worker_handle) = start_event_worker(&config, db.clone());
    let srv = create_server_instance(config, db, producer)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))?;
    // The server held the remaining producer handles. Now that it is gone the queue is closed, and the worker
    // applies whatever is still queued before it exits.
    info!("📬️ Server stopped. Waiting for the event worker to drain the queue.");
    worker_handle.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Starts the single reconciliation worker for this process.
///
/// The returned handle completes once every producer handle has been dropped and the remaining queue entries have
/// been applied, so await it during shutdown to get a clean drain.
pub fn start_event_worker(config: &ServerConfig, db: SqliteDatabase) -> (EventProducer, JoinHandle<()>) {
    let reconciler = OrderReconciler::new(db);
    let (producer, worker) =
        event_pipeline(reconciler, config.queue_size, config.dedup_capacity, config.store_timeout);
    let handle = tokio::spawn(worker.run());
    (producer, handle)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producer: EventProducer,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let hmac = HmacMiddlewareFactory::new(
            SHOPIFY_HMAC_HEADER,
            config.shopify_config.hmac_secret.clone(),
            config.shopify_config.hmac_checks,
        );
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sor::access_log"))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(producer.clone()));
        let api_scope = web::scope("/api")
            .service(UnfulfilledOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new());
        let shopify_scope = web::scope("/shopify").wrap(hmac).service(shopify_webhook);
        app.service(health).service(api_scope).service(shopify_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
