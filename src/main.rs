use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use gateway_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    // Webhook senders are unauthenticated third parties; only rate limiting
    // sits in front of the ingestion endpoints.
    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/webhooks/test", post(routes::ingest::handle_test_webhook))
        .route(
            "/webhooks/:service",
            post(routes::ingest::handle_service_webhook),
        )
        .layer(axum::middleware::from_fn_with_state(
            gateway_backend::middleware::rate_limit::new_rps_state(config.public_rps),
            gateway_backend::middleware::rate_limit::rps_middleware,
        ));

    let management_api = Router::new()
        .route("/webhook-logs", get(routes::logs::list_webhook_logs))
        .route(
            "/integrations",
            get(routes::integration::list_integrations)
                .post(routes::integration::create_integration),
        )
        .route(
            "/integrations/:id",
            get(routes::integration::get_integration)
                .put(routes::integration::update_integration)
                .delete(routes::integration::delete_integration),
        )
        .route(
            "/integrations/:id/test",
            post(routes::integration::test_integration),
        )
        .layer(axum::middleware::from_fn(
            gateway_backend::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            gateway_backend::middleware::rate_limit::new_rps_state(config.integration_rps),
            gateway_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = public_api
        .merge(management_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
