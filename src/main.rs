use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use salesdeck_web::cache::start_cache_warmer;
use salesdeck_web::config::Config;
use salesdeck_web::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sales deck service");
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Deck filename: {}", config.deck_filename);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to the database")?;
    tracing::info!("Connected to database");

    let bind_addr = config.bind_addr;
    let state = AppState::new(pool, config);

    tokio::spawn(start_cache_warmer(state.cache.clone(), state.db.clone()));

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
