//! Site catalog browsing

use std::collections::BTreeSet;

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::catalog::{self, CatalogScope};
use crate::error::{AppError, Result};
use crate::models::DeckSite;
use crate::selection::{AvailabilityFilter, PriceRange, SelectionStore, SiteFilters};
use crate::AppState;

/// Query parameters for the site listing.
///
/// List-valued parameters are comma separated, e.g.
/// `?area=Makati,Taguig&price=0-50000,50000-100000`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteQuery {
    pub search: Option<String>,
    pub area: Option<String>,
    pub availability: Option<String>,
    pub landmark: Option<String>,
    pub price: Option<String>,
    pub scope: CatalogScope,
}

impl SiteQuery {
    pub fn filters(&self) -> Result<SiteFilters> {
        Ok(SiteFilters {
            areas: split_list(self.area.as_deref()).collect(),
            availability: AvailabilityFilter::from_labels(split_list(self.availability.as_deref())),
            price_ranges: split_list(self.price.as_deref())
                .map(|r| parse_price_range(&r))
                .collect::<Result<Vec<_>>>()?,
            landmark_categories: split_list(self.landmark.as_deref()).collect::<BTreeSet<_>>(),
        })
    }
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = String> + '_ {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse `"from-to"`
fn parse_price_range(value: &str) -> Result<PriceRange> {
    let bad = || AppError::BadRequest(format!("invalid price range {:?}", value));
    let (from, to) = value.split_once('-').ok_or_else(bad)?;
    let from: Decimal = from.trim().parse().map_err(|_| bad())?;
    let to: Decimal = to.trim().parse().map_err(|_| bad())?;
    if from > to {
        return Err(bad());
    }
    Ok(PriceRange { from, to })
}

/// Filtered, naturally sorted catalog
pub async fn list(State(state): State<AppState>, Query(query): Query<SiteQuery>) -> Result<Json<Vec<DeckSite>>> {
    let mut store = SelectionStore::new();
    store.set_filters(query.filters()?);
    store.set_search(query.search.clone().unwrap_or_default());

    let today = catalog::today();
    let sites = catalog::load_catalog(&state.db, &state.cache, query.scope, today).await?;
    let landmarks = catalog::load_landmarks(&state.db, &state.cache).await?;

    let visible = store.visible(&sites, &landmarks, today);
    tracing::debug!("{} of {} sites visible", visible.len(), sites.len());

    Ok(Json(visible))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_query_to_filters() {
        let query = SiteQuery {
            area: Some("Makati, Taguig,,".to_string()),
            availability: Some("open".to_string()),
            landmark: Some("mall".to_string()),
            price: Some("0-50000,50000-100000".to_string()),
            ..Default::default()
        };

        let filters = query.filters().unwrap();
        assert_eq!(filters.areas.len(), 2);
        assert!(filters.areas.contains("Taguig"));
        assert_eq!(filters.availability, AvailabilityFilter::Open);
        assert_eq!(
            filters.price_ranges[1],
            PriceRange {
                from: dec!(50000),
                to: dec!(100000)
            }
        );
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let filters = SiteQuery::default().filters().unwrap();
        assert_eq!(filters, SiteFilters::default());
    }

    #[test]
    fn test_bad_price_range_rejected() {
        for raw in ["100", "a-b", "500-100"] {
            let query = SiteQuery {
                price: Some(raw.to_string()),
                ..Default::default()
            };
            assert!(matches!(query.filters(), Err(AppError::BadRequest(_))), "{}", raw);
        }
    }
}
