use std::net::SocketAddr;
use std::sync::Arc;

use skyfare_api::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skyfare_api=debug,skyfare_search=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skyfare_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Skyfare API on port {}", config.server.port);

    // Redis Connection
    let store = skyfare_store::RedisStore::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let store: Arc<dyn skyfare_store::SearchStore> = Arc::new(store);

    let orchestrator = Arc::new(skyfare_search::SearchOrchestrator::new(
        store.clone(),
        config.search.clone(),
    ));

    let app_state = AppState {
        store,
        orchestrator,
        rules: config.search.clone(),
        port: config.server.port,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
