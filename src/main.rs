use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tokio::sync::watch;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use billrun::billing::{BillingService, Scheduler};
use billrun::config::Config;
use billrun::core::SystemClock;
use billrun::customers::{CustomerService, MySqlCustomerRepository};
use billrun::gateways::HttpPaymentGateway;
use billrun::invoices::{InvoiceService, MySqlInvoiceRepository};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config.app.log_level, &config.app.log_format);

    tracing::info!("Starting billrun");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.max_connections
    );

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    let invoice_repo = Arc::new(MySqlInvoiceRepository::new(db_pool.clone()));
    let customer_repo = Arc::new(MySqlCustomerRepository::new(db_pool));
    let gateway = Arc::new(
        HttpPaymentGateway::new(
            config.gateway.api_key.clone(),
            config.gateway.base_url.clone(),
            config.billing.charge_timeout(),
        )
        .context("Failed to build payment gateway client")?,
    );
    let clock = Arc::new(SystemClock);

    let billing = Arc::new(BillingService::new(
        invoice_repo.clone(),
        customer_repo.clone(),
        gateway,
        clock.clone(),
        config.billing.clone(),
    ));

    let scheduler = Scheduler::new(billing, clock, config.billing.offset())
        .run_on_startup(config.billing.run_on_startup);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    let invoice_service = Arc::new(InvoiceService::new(invoice_repo));
    let customer_service = Arc::new(CustomerService::new(customer_repo));

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(invoice_service.clone()))
            .app_data(web::Data::new(customer_service.clone()))
            .route("/health", web::get().to(billrun::health_check))
            .configure(billrun::configure_rest)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    let served = server.await;

    tracing::info!("Server stopped, waiting for billing scheduler");
    shutdown_tx.send(true).ok();
    scheduler_handle
        .await
        .context("Billing scheduler task failed")?;

    served.context("HTTP server error")
}

fn init_tracing(log_level: &str, log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("billrun={},actix_web=info", log_level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
