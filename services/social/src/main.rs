use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, health_check, init_pool};
use social::{
    AppState,
    config::{ServerConfig, StoreBackend},
    middleware::{JwtConfig, JwtVerifier},
    repositories::{MemoryStore, PgSocialStore, SocialStore, postgres},
    routes,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting social service");

    let server_config = ServerConfig::from_env()?;

    let store: Arc<dyn SocialStore> = match server_config.store_backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            postgres::migrate(&pool).await?;
            Arc::new(PgSocialStore::new(pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let jwt_config = JwtConfig::from_env()?;
    let jwt_verifier = JwtVerifier::new(&jwt_config)?;

    let app_state = AppState {
        store,
        jwt_verifier,
        suggestion_limit: server_config.suggestion_limit,
    };

    let app = routes::create_router(app_state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Social service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down social service");
        })
        .await?;

    Ok(())
}
