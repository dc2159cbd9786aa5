//! Site reference data and the deck-specific view of a site

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Label rendered for a site with no future commitment
pub const OPEN_LABEL: &str = "OPEN";

/// Physical advertising structure from `sites`
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Site {
    pub structure_code: String,
    pub site_code: String,
    /// Area / city the structure stands in
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub facing: Option<String>,
    #[serde(default)]
    pub bound: Option<String>,
    #[serde(default)]
    pub traffic_count: Option<i64>,
    #[serde(default)]
    pub population: Option<i64>,
    /// Base monthly rate as a numeric string
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Site {
    /// Parse the base monthly rate.
    ///
    /// `Ok(None)` when the site has no price; `Err` when the stored string is
    /// not a number. Thousands separators are tolerated.
    pub fn base_price(&self) -> Result<Option<Decimal>, rust_decimal::Error> {
        match self.price.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Decimal::from_str(&raw.replace(',', "")).map(Some),
        }
    }

    /// Coordinates, when both halves are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Contract overlay row from `site_contracts`
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SiteContract {
    pub site_code: String,
    pub end_date: Option<NaiveDate>,
    pub adjusted_end_date: Option<NaiveDate>,
}

impl SiteContract {
    /// Adjusted end date wins over the original end date
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.adjusted_end_date.or(self.end_date)
    }
}

/// Booking record from `bookings`
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub site_code: String,
    pub booking_status: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl Booking {
    pub fn is_cancelled(&self) -> bool {
        self.booking_status.eq_ignore_ascii_case("CANCELLED")
    }
}

/// Point of interest used for proximity filtering
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub types: Vec<String>,
}

impl Landmark {
    pub fn has_any_type<'a, I>(&self, categories: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        categories
            .into_iter()
            .any(|c| self.types.iter().any(|t| t.eq_ignore_ascii_case(c)))
    }
}

/// A site as it flows through the deck pipeline.
///
/// Carries the computed availability plus the landmarks and images the user
/// attached while building the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSite {
    #[serde(flatten)]
    pub site: Site,
    /// Date the site frees up; `None` means always open
    #[serde(default)]
    pub availability: Option<NaiveDate>,
    #[serde(default)]
    pub landmarks: Vec<String>,
    /// Site photo as a `data:` URL
    #[serde(default)]
    pub image: Option<String>,
    /// Rendered map as a `data:` URL
    #[serde(default)]
    pub map_image: Option<String>,
}

impl DeckSite {
    pub fn new(site: Site, availability: Option<NaiveDate>) -> Self {
        Self {
            site,
            availability,
            landmarks: Vec::new(),
            image: None,
            map_image: None,
        }
    }

    pub fn site_code(&self) -> &str {
        &self.site.site_code
    }

    /// A site is open when it has no availability date or the date is today or past
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.availability.map_or(true, |date| date <= today)
    }

    /// Availability as printed on a slide
    pub fn availability_label(&self, today: NaiveDate) -> String {
        match self.availability {
            Some(date) if date > today => date.format("%B %-d, %Y").to_string(),
            _ => OPEN_LABEL.to_string(),
        }
    }

    /// Month bucket used by the month/year availability filter
    pub fn availability_month(&self) -> Option<String> {
        self.availability.map(|date| date.format("%B %Y").to_string())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn site(code: &str, city: &str, price: Option<&str>) -> Site {
        Site {
            structure_code: format!("ST-{}", code),
            site_code: code.to_string(),
            city: city.to_string(),
            address: format!("{} Main Road, {}", code, city),
            latitude: Some(14.5547),
            longitude: Some(121.0244),
            size: Some("40ft x 60ft".to_string()),
            facing: Some("North".to_string()),
            bound: Some("Southbound".to_string()),
            traffic_count: Some(350_000),
            population: Some(1_200_000),
            price: price.map(str::to_string),
            created_at: None,
        }
    }

    pub fn deck_site(code: &str, price: Option<&str>) -> DeckSite {
        DeckSite::new(site(code, "Makati", price), None)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_base_price_parsing() {
        assert_eq!(site("A", "Makati", Some("150,000.50")).base_price().unwrap(), Some(dec!(150000.50)));
        assert_eq!(site("A", "Makati", None).base_price().unwrap(), None);
        assert_eq!(site("A", "Makati", Some("  ")).base_price().unwrap(), None);
        assert!(site("A", "Makati", Some("call us")).base_price().is_err());
    }

    #[test]
    fn test_availability_label() {
        let today = date(2024, 3, 10);
        let mut s = deck_site("A", None);
        assert_eq!(s.availability_label(today), OPEN_LABEL);

        s.availability = Some(date(2024, 3, 10));
        assert_eq!(s.availability_label(today), OPEN_LABEL);
        assert!(s.is_open_on(today));

        s.availability = Some(date(2024, 4, 2));
        assert_eq!(s.availability_label(today), "April 2, 2024");
        assert_eq!(s.availability_month().as_deref(), Some("April 2024"));
        assert!(!s.is_open_on(today));
    }

    #[test]
    fn test_booking_cancelled_is_case_insensitive() {
        let booking = Booking {
            site_code: "A".to_string(),
            booking_status: "cancelled".to_string(),
            date_from: date(2024, 1, 1),
            date_to: date(2024, 2, 1),
        };
        assert!(booking.is_cancelled());
    }

    #[test]
    fn test_deck_site_deserializes_flat_payload() {
        let json = serde_json::json!({
            "structure_code": "ST-1",
            "site_code": "MKT-001",
            "city": "Makati",
            "price": "1000",
            "availability": "2024-05-01",
            "landmarks": ["Greenbelt"]
        });
        let site: DeckSite = serde_json::from_value(json).unwrap();
        assert_eq!(site.site_code(), "MKT-001");
        assert_eq!(site.availability, Some(date(2024, 5, 1)));
        assert_eq!(site.landmarks, vec!["Greenbelt".to_string()]);
        assert!(site.image.is_none());
    }
}
