use std::sync::Arc;

use telco_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    errors::AppError,
    repository::{InMemoryUserRepository, UserRepositoryState},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads the configuration, installs logging, and serves the portal.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "telco_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.maintenance.is_on() {
        tracing::warn!("maintenance mode is on; gated pages redirect to /maintenance");
    }

    let users = match config.env {
        Env::Local => {
            tracing::warn!("demo accounts accept the shared demo password");
            InMemoryUserRepository::seeded()
        }
        Env::Production => InMemoryUserRepository::seeded_without_passwords(),
    };
    let users = Arc::new(users) as UserRepositoryState;
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, users));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::configuration(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .map_err(|err| AppError::internal(format!("server error: {err}")))
}
