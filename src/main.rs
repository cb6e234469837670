//! Flexfume Commerce - storefront backend

use anyhow::Result;
use axum::http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flexfume_commerce::api::{self, AppState};
use flexfume_commerce::config::Config;
use flexfume_commerce::events::EventPublisher;
use flexfume_commerce::services::Services;
use flexfume_commerce::store::{MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    let config = Config::from_env()?;

    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let services = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Services::new(Arc::new(PgStore::new(db)), events)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data lives in memory only");
            Services::new(Arc::new(MemoryStore::new()), events)
        }
    };

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors(&config.cors_origins)?);
    let app = api::router(AppState::new(services)).layer(layers);

    tracing::info!("🚀 Flexfume Commerce listening on 0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn cors(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);
    Ok(cors)
}
