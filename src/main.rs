use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info, warn};

use swiftpay_backend::api::payments as payments_api;
use swiftpay_backend::api::products as products_api;
use swiftpay_backend::api::webhooks as webhooks_api;
use swiftpay_backend::config::AppConfig;
use swiftpay_backend::database::{
    self, plan_cache_repository::PlanCacheRepository, plan_cache_repository::PlanCacheStore,
    transaction_repository::TransactionRepository, transaction_repository::TransactionStore,
};
use swiftpay_backend::logging::init_tracing;
use swiftpay_backend::middleware::logging::{request_logging_middleware, UuidRequestId};
use swiftpay_backend::payments::gateway::PaymentGateway;
use swiftpay_backend::payments::paystack::PaystackClient;
use swiftpay_backend::services::payments::PaymentService;
use swiftpay_backend::services::plans::PlanService;
use swiftpay_backend::services::vending::VendingService;
use swiftpay_backend::services::webhook::WebhookService;
use swiftpay_backend::vending::engine::DispatchEngine;
use swiftpay_backend::vending::vtpass::{VendorApi, VtpassClient};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        "Starting swiftpay backend service"
    );

    info!("Initializing database connection pool...");
    let db_pool = database::init_pool_from_config(&config.database)
        .await
        .map_err(|e| {
            error!("Failed to initialize database pool: {}", e);
            anyhow::anyhow!("database initialization failed: {e}")
        })?;

    let transaction_store: Arc<dyn TransactionStore> =
        Arc::new(TransactionRepository::new(db_pool.clone()));
    let plan_cache: Arc<dyn PlanCacheStore> = Arc::new(PlanCacheRepository::new(db_pool.clone()));

    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        PaystackClient::new(config.paystack.clone())
            .map_err(|e| anyhow::anyhow!("paystack client initialization failed: {e}"))?,
    );
    let vendor: Arc<dyn VendorApi> = Arc::new(
        VtpassClient::new(config.vtpass.clone())
            .map_err(|e| anyhow::anyhow!("vtpass client initialization failed: {e}"))?,
    );
    if config.vtpass.is_sandbox() {
        info!("VTpass sandbox mode: soft-failure bypass codes are active");
    }

    let vending_service = Arc::new(VendingService::new(
        transaction_store.clone(),
        DispatchEngine::new(vendor.clone()),
    ));
    let payment_service = Arc::new(PaymentService::new(
        gateway.clone(),
        transaction_store.clone(),
        vending_service.clone(),
    ));
    let plan_service = Arc::new(PlanService::new(plan_cache, vendor));
    let webhook_service = Arc::new(WebhookService::new(
        gateway,
        transaction_store,
        vending_service,
    ));

    info!("Setting up application routes...");

    let payments_state = Arc::new(payments_api::PaymentsState {
        service: payment_service,
    });
    let mut payment_routes = Router::new()
        .route(
            "/api/payments/initialize",
            post(payments_api::initialize_payment),
        )
        .route("/api/payments/verify", post(payments_api::verify_payment));
    if config.server.enable_mock_payments {
        warn!("Mock payment confirmation route ENABLED - never run this in production");
        payment_routes = payment_routes.route(
            "/api/payments/mock-confirm",
            post(payments_api::confirm_mock_payment),
        );
    }
    let payment_routes = payment_routes.with_state(payments_state);

    let product_routes = Router::new()
        .route("/api/products/data-plans", post(products_api::data_plans))
        .route("/api/products/hot-deals", get(products_api::hot_deals))
        .with_state(Arc::new(products_api::ProductsState {
            service: plan_service,
        }));

    let webhook_routes = Router::new()
        .route(
            "/webhooks/paystack",
            post(webhooks_api::handle_paystack_webhook),
        )
        .with_state(Arc::new(webhooks_api::WebhookState {
            service: webhook_service,
        }));

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(db_pool)
        .merge(payment_routes)
        .merge(product_routes)
        .merge(webhook_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "Server listening on http://{}", addr);
    info!("Server is ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn root() -> &'static str {
    "Welcome to the Swiftpay Backend API"
}

async fn health(
    State(pool): State<sqlx::PgPool>,
) -> Result<&'static str, (StatusCode, &'static str)> {
    match database::health_check(&pool).await {
        Ok(()) => Ok("OK"),
        Err(e) => {
            error!("Health check failed - database unreachable: {}", e);
            Err((StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable"))
        }
    }
}
