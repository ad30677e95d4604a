use std::sync::Arc;

use storefront_web::{
    config::{AppConfig, SessionBackend},
    create_router,
    session::{MemorySessionStore, RedisSessionStore, SessionStore},
    AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging, filtered by RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Storefront web gateway - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        "External API at {}{}",
        config.api.base_url,
        config.api.prefix
    );

    // Session storage
    let sessions: Arc<dyn SessionStore> = match &config.session.backend {
        SessionBackend::Memory => {
            tracing::info!("Using in-memory session store");
            Arc::new(MemorySessionStore::with_ttl(config.session.ttl))
        }
        SessionBackend::Redis { url } => {
            tracing::info!("Connecting to Redis session store...");
            Arc::new(
                RedisSessionStore::connect(url, config.session.ttl)
                    .await
                    .expect("Failed to connect to Redis"),
            )
        }
    };

    let addr = config.bind_addr();
    let state = AppState::new(config, sessions).expect("Failed to build HTTP client");

    // Create the application router
    let app = create_router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Storefront web gateway is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
