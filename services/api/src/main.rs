use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod auth;
mod booking;
mod config;
mod error;
mod jwt;
mod key_server;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
#[cfg(test)]
mod test_support;
mod validation;

use common::database::{health_check, init_pool, run_migrations};
use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    jwt::JwtService,
    key_server::HttpKeyService,
    repositories::{PgBookingRepository, PgRoomRepository, PgUserRepository, room::DEFAULT_ROOMS},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting smart lock API service");

    let config = AppConfig::from_env()?;

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    // Initialize repositories
    let user_repository = PgUserRepository::new(pool.clone());
    let room_repository = PgRoomRepository::new(pool.clone());
    let booking_repository = PgBookingRepository::new(pool);

    room_repository.seed(&DEFAULT_ROOMS).await?;

    let key_service = HttpKeyService::new(&config.key_server)?;
    let jwt_service = JwtService::new(config.jwt.clone());

    let app_state = AppState::new(
        Arc::new(user_repository),
        Arc::new(room_repository),
        Arc::new(booking_repository),
        Arc::new(key_service),
        jwt_service,
    );

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("API service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
