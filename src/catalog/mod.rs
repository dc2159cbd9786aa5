//! Site catalog: reference sites merged with live availability.
//!
//! Data-source failures propagate to the caller; an empty catalog is never
//! substituted for an error.

pub mod resolver;

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use serde::Deserialize;
use sqlx::PgPool;

use crate::cache::{AppCache, LANDMARKS_KEY};
use crate::db::queries;
use crate::error::Result;
use crate::models::{DeckSite, Landmark};

pub use resolver::resolve_catalog;

/// Sites added within this many days count as recently added
pub const RECENTLY_ADDED_DAYS: u64 = 30;

/// Subset of the catalog a caller asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogScope {
    #[default]
    All,
    /// Open as of today
    Available,
    RecentlyAdded,
}

impl CatalogScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogScope::All => "all",
            CatalogScope::Available => "available",
            CatalogScope::RecentlyAdded => "recently_added",
        }
    }

    pub fn includes(&self, site: &DeckSite, today: NaiveDate) -> bool {
        match self {
            CatalogScope::All => true,
            CatalogScope::Available => site.is_open_on(today),
            CatalogScope::RecentlyAdded => {
                let since = today
                    .checked_sub_days(Days::new(RECENTLY_ADDED_DAYS))
                    .unwrap_or(NaiveDate::MIN);
                site.site
                    .created_at
                    .map_or(false, |created| created.date_naive() >= since)
            }
        }
    }
}

/// Current calendar day in the server's timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Load the resolved catalog for `scope`, cached per day
pub async fn load_catalog(
    pool: &PgPool,
    cache: &AppCache,
    scope: CatalogScope,
    today: NaiveDate,
) -> Result<Arc<Vec<DeckSite>>> {
    let key = AppCache::catalog_key(scope, today);
    if let Some(cached) = cache.catalog.get(&key).await {
        tracing::debug!("Cache HIT for {}", key);
        return Ok(cached);
    }
    tracing::debug!("Cache MISS for {}", key);

    let sites = queries::get_sites(pool).await?;
    let contracts = queries::get_site_contracts(pool).await?;
    let bookings = queries::get_active_bookings(pool).await?;

    let resolved: Vec<DeckSite> = resolve_catalog(sites, &contracts, &bookings, today)
        .into_iter()
        .filter(|site| scope.includes(site, today))
        .collect();
    tracing::info!("Resolved {} sites for scope {}", resolved.len(), scope.as_str());

    let resolved = Arc::new(resolved);
    cache.catalog.insert(key, resolved.clone()).await;
    Ok(resolved)
}

/// Load landmarks for proximity filtering
pub async fn load_landmarks(pool: &PgPool, cache: &AppCache) -> Result<Arc<Vec<Landmark>>> {
    if let Some(cached) = cache.landmarks.get(LANDMARKS_KEY).await {
        return Ok(cached);
    }

    let landmarks = Arc::new(queries::get_landmarks(pool).await?);
    cache
        .landmarks
        .insert(LANDMARKS_KEY.to_string(), landmarks.clone())
        .await;
    Ok(landmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::site::fixtures::deck_site;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_scope_filters() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut site = deck_site("A", None);

        assert!(CatalogScope::All.includes(&site, today));
        assert!(CatalogScope::Available.includes(&site, today));
        assert!(!CatalogScope::RecentlyAdded.includes(&site, today));

        site.site.created_at = Some(Utc.with_ymd_and_hms(2024, 2, 20, 8, 0, 0).unwrap());
        assert!(CatalogScope::RecentlyAdded.includes(&site, today));

        site.availability = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert!(!CatalogScope::Available.includes(&site, today));
    }

    #[test]
    fn test_scope_deserializes_snake_case() {
        let scope: CatalogScope = serde_json::from_str(r#""recently_added""#).unwrap();
        assert_eq!(scope, CatalogScope::RecentlyAdded);
    }
}
