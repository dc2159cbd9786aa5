//! In-memory caching using moka
//!
//! Holds the resolved site catalog, landmarks and the deck listing so that
//! filtering requests don't hit Postgres each time.

use chrono::NaiveDate;
use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::catalog::{self, CatalogScope};
use crate::models::{DeckSite, DeckSummary, Landmark};

/// Application cache
#[derive(Clone)]
pub struct AppCache {
    /// Resolved catalog (scope + day -> sites)
    pub catalog: Cache<String, Arc<Vec<DeckSite>>>,
    /// Landmarks (singleton)
    pub landmarks: Cache<String, Arc<Vec<Landmark>>>,
    /// Deck listing (singleton)
    pub decks: Cache<String, Arc<Vec<DeckSummary>>>,
}

pub const LANDMARKS_KEY: &str = "landmarks";
pub const DECKS_KEY: &str = "decks";

impl AppCache {
    /// Create a new cache instance; `catalog_ttl` bounds catalog staleness
    pub fn new(catalog_ttl: Duration) -> Self {
        Self {
            // Catalog: one entry per scope per day
            catalog: Cache::builder()
                .max_capacity(16)
                .time_to_live(catalog_ttl)
                .build(),

            // Landmarks: 1 entry, 1 hour TTL (reference data)
            landmarks: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(60 * 60))
                .build(),

            // Deck listing: 1 entry, 5 min TTL, invalidated on writes
            decks: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            catalog_size: self.catalog.entry_count(),
            landmarks_cached: self.landmarks.entry_count() > 0,
            decks_cached: self.decks.entry_count() > 0,
        }
    }

    /// Drop the deck listing after a deck write
    pub async fn invalidate_decks(&self) {
        self.decks.invalidate(DECKS_KEY).await;
    }

    /// Generate cache key for a catalog scope on a given day
    pub fn catalog_key(scope: CatalogScope, today: NaiveDate) -> String {
        format!("catalog:{}:{}", scope.as_str(), today)
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub catalog_size: u64,
    pub landmarks_cached: bool,
    pub decks_cached: bool,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the full catalog and landmarks
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    let today = catalog::today();
    cache
        .catalog
        .invalidate(&AppCache::catalog_key(CatalogScope::All, today))
        .await;
    if let Err(e) = catalog::load_catalog(db, cache, CatalogScope::All, today).await {
        warn!("Failed to warm catalog cache: {}", e);
    }

    cache.landmarks.invalidate(LANDMARKS_KEY).await;
    if let Err(e) = catalog::load_landmarks(db, cache).await {
        warn!("Failed to warm landmarks cache: {}", e);
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_key_and_stats() {
        let cache = AppCache::new(Duration::from_secs(60));
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let key = AppCache::catalog_key(CatalogScope::Available, today);
        assert_eq!(key, "catalog:available:2024-03-01");

        cache.decks.insert(DECKS_KEY.to_string(), Arc::new(Vec::new())).await;
        assert!(cache.decks.get(DECKS_KEY).await.is_some());

        cache.invalidate_decks().await;
        assert!(cache.decks.get(DECKS_KEY).await.is_none());
        assert!(!cache.stats().landmarks_cached);
    }
}
