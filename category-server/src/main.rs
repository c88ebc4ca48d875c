use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::category_service::CategoryService;
use data::repositories::postgres::category_store::PostgresCategoryStore;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::identity_client::GrpcAuthGateway;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database_url, settings.database_max_connections).await?;
    run_migrations(&pool).await?;

    let auth_gateway = GrpcAuthGateway::connect_lazy(
        &settings.identity_grpc_addr,
        Duration::from_secs(settings.identity_connect_timeout_secs),
        Duration::from_secs(settings.identity_request_timeout_secs),
    )?;
    info!(addr = %settings.identity_grpc_addr, "identity client configured");

    let category_service = Arc::new(CategoryService::new(PostgresCategoryStore::new(pool)));
    let state = AppState::new(category_service, Arc::new(auth_gateway));

    server::run_http(&settings, state).await
}
