pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod webhooks;

use crate::services::{
    connectivity_service::ConnectivityService, integration_service::IntegrationService,
    webhook_service::WebhookService,
};
use crate::webhooks::router::WebhookRouter;
use sqlx::PgPool;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub webhook_service: WebhookService,
    pub integration_service: IntegrationService,
    pub connectivity_service: ConnectivityService,
    pub webhook_router: WebhookRouter,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let webhook_service = WebhookService::new(pool.clone());
        let integration_service = IntegrationService::new(pool.clone());
        let connectivity_service = ConnectivityService::new();
        let webhook_router =
            WebhookRouter::with_default_routes(Duration::from_millis(config.handler_timeout_ms));

        Self {
            pool,
            webhook_service,
            integration_service,
            connectivity_service,
            webhook_router,
        }
    }
}
