//! Site filter predicates.
//!
//! Evaluated per site in a fixed order, stopping at the first failing
//! predicate: search, area, availability, landmark proximity, price range.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{DeckSite, Landmark};

/// Sites vacating within this many days still count as open
pub const AVAILABILITY_WINDOW_DAYS: u64 = 60;

/// Maximum distance between a site and a requested landmark
pub const LANDMARK_RADIUS_KM: f64 = 100.0;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Availability predicate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AvailabilityFilter {
    #[default]
    All,
    /// Open now or vacating within the window
    Open,
    /// Committed beyond the window
    Booked,
    /// Availability falls in one of these `"MMMM yyyy"` months
    Months(BTreeSet<String>),
}

impl AvailabilityFilter {
    /// Build from the labels a client sends.
    ///
    /// The special labels `all`, `open` and `booked` take precedence in that
    /// order; any other labels are month/year buckets.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        let has = |key: &str| labels.iter().any(|l| l.eq_ignore_ascii_case(key));
        if labels.is_empty() || has("all") {
            AvailabilityFilter::All
        } else if has("open") {
            AvailabilityFilter::Open
        } else if has("booked") {
            AvailabilityFilter::Booked
        } else {
            AvailabilityFilter::Months(labels)
        }
    }

    pub fn matches(&self, site: &DeckSite, today: NaiveDate) -> bool {
        let cutoff = today
            .checked_add_days(Days::new(AVAILABILITY_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);
        let vacates_soon = site.availability.map_or(true, |date| date <= cutoff);

        match self {
            AvailabilityFilter::All => true,
            AvailabilityFilter::Open => vacates_soon,
            AvailabilityFilter::Booked => !vacates_soon,
            AvailabilityFilter::Months(months) => site
                .availability_month()
                .map_or(false, |month| months.contains(&month)),
        }
    }
}

/// Inclusive price bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub from: Decimal,
    pub to: Decimal,
}

impl PriceRange {
    pub fn is_zero(&self) -> bool {
        self.from.is_zero() && self.to.is_zero()
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.from <= price && price <= self.to
    }
}

/// Structured filters of the selection store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteFilters {
    pub areas: BTreeSet<String>,
    pub availability: AvailabilityFilter,
    pub price_ranges: Vec<PriceRange>,
    pub landmark_categories: BTreeSet<String>,
}

impl SiteFilters {
    /// Landmarks whose types intersect the requested categories.
    ///
    /// Computed once per filtering pass.
    pub fn relevant_landmarks<'a>(&self, landmarks: &'a [Landmark]) -> Vec<&'a Landmark> {
        if self.landmark_categories.is_empty() {
            return Vec::new();
        }
        landmarks
            .iter()
            .filter(|l| l.has_any_type(&self.landmark_categories))
            .collect()
    }

    /// Evaluate area, availability, landmark and price predicates in order
    pub fn matches(&self, site: &DeckSite, relevant_landmarks: &[&Landmark], today: NaiveDate) -> bool {
        if !self.areas.is_empty() && !self.areas.contains(&site.site.city) {
            return false;
        }

        if !self.availability.matches(site, today) {
            return false;
        }

        if !self.landmark_categories.is_empty() && !near_any(site, relevant_landmarks) {
            return false;
        }

        let ranges: Vec<&PriceRange> = self.price_ranges.iter().filter(|r| !r.is_zero()).collect();
        if !ranges.is_empty() {
            let Ok(Some(price)) = site.site.base_price() else {
                return false;
            };
            if !ranges.iter().any(|r| r.contains(price)) {
                return false;
            }
        }

        true
    }
}

fn near_any(site: &DeckSite, landmarks: &[&Landmark]) -> bool {
    let Some((lat, lng)) = site.site.coordinates() else {
        return false;
    };
    landmarks
        .iter()
        .any(|l| haversine_km(lat, lng, l.latitude, l.longitude) <= LANDMARK_RADIUS_KM)
}

/// Great-circle distance in kilometres
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}
