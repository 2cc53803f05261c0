#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::sync::Arc;

use axum::Router;
use lectern::platform::Platform;
use lectern_api::{construct_router, state::State};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod reconcile;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Lectern API service");

    let config = config::Config::from_env()?;

    let platform_raw = std::fs::read_to_string(&config.platform_path)?;
    let platform = Platform::from_json(&platform_raw)?;
    tracing::info!("Loaded platform config: {}", platform.name);

    let jwks_raw = std::fs::read_to_string(&config.jwks_path)?;
    let jwks: jsonwebtoken::jwk::JwkSet = lectern_types::json::from_str(&jwks_raw)?;

    let state = Arc::new(State::new(platform, jwks).await);

    reconcile::spawn(state.clone(), config.pending_purchase_ttl);

    let app = Router::new().merge(construct_router(state.clone()));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
