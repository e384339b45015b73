use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod error;
mod jwt;
mod middleware;
mod models;
mod rate_limiter;
mod repositories;
mod routes;
mod services;
mod settings;
mod state;
mod validation;

#[cfg(test)]
mod testing;

use common::database::{health_check, init_pool};

use crate::{
    jwt::JwtService, rate_limiter::RateLimiter, repositories::PgUserRepository,
    services::UserManager, settings::Settings,
};

pub use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.server.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting todo API service");

    // Initialize database connection pool
    let pool = init_pool(&settings.database).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let jwt_service = JwtService::new(&settings.jwt)?;
    let user_repository = PgUserRepository::new(pool);
    let user_service = UserManager::new(Arc::new(user_repository), jwt_service.clone());
    let rate_limiter = RateLimiter::new(settings.rate_limit.clone());
    info!(
        "Rate limiting public routes to {} requests per {}s",
        rate_limiter.config().max_attempts,
        rate_limiter.config().window_seconds
    );

    let app_state = AppState {
        user_service: Arc::new(user_service),
        jwt_service,
        rate_limiter,
    };

    // Start the web server
    let app = routes::create_router(
        app_state,
        &settings.server.api_prefix,
        Duration::from_secs(settings.server.request_timeout_secs),
    );

    let address = settings.server.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Todo API service listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
