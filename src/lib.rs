//! Sales deck generator for outdoor-advertising sites.
//!
//! Browses the site catalog, prices selected sites under per-deck options and
//! renders them into a downloadable slide deck.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod deck;
pub mod error;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod selection;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cache::AppCache;
use config::Config;
use deck::GenerationProgress;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
    pub config: Arc<Config>,
    pub progress: GenerationProgress,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            cache: AppCache::new(config.catalog_ttl),
            config: Arc::new(config),
            progress: GenerationProgress::new(),
        }
    }
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/sites", get(routes::sites::list))
        .route("/decks", get(routes::decks::list).post(routes::decks::create))
        .route("/decks/generate", post(routes::decks::generate))
        .route("/decks/status", get(routes::decks::status))
        .route("/decks/:id", delete(routes::decks::delete))
        .route("/decks/:id/download", get(routes::decks::download))
        .route("/decks/:id/preview", get(routes::decks::preview))
        .nest("/pricing", pricing::router());

    Router::new()
        .route("/health", get(routes::health))
        .route("/health/cache", get(routes::cache_stats))
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
