//! Storyboard server: reads settings from the environment (and `.env`), prepares
//! the store, and serves the API.
//!
//! Run from repo root: `cargo run -p storyboard-server`

use std::sync::Arc;
use storyboard_api::{app, ensure_database_exists, AppState, MemoryStore, PgStore, Settings, Store, StoreKind, TokenIssuer};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("storyboard_api=info,storyboard_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let store: Arc<dyn Store> = match settings.store {
        StoreKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.db_max_connections)
                .connect(&settings.database_url)
                .await?;
            let store = PgStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, TokenIssuer::new(&settings.jwt_secret, settings.token_ttl_secs));
    let router = app(state, settings.max_upload_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
