//! HTTP route handlers

pub mod decks;
pub mod sites;

use axum::{extract::State, Json};

use crate::cache::CacheStats;
use crate::AppState;

pub async fn health() -> &'static str {
    "OK"
}

/// Cache statistics for monitoring
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}
