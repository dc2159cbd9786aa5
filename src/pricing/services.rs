//! Site-level pricing services.
//!
//! Bridges raw site records to the pure calculators: parses the stored price
//! string and reports malformed data as a typed error.

use rust_decimal::Decimal;

use crate::models::DeckSite;

use super::calculators::{compute_site_pricing, PricingContext, SitePricing};

/// Pricing error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Site {site_code} has a malformed price {raw:?}")]
    MalformedPrice { site_code: String, raw: String },

    #[error("Exchange rate for {currency} must be non-zero")]
    ZeroExchangeRate { currency: String },

    #[error("Rate generator duration {duration} is not one of 3, 6 or 12 months")]
    InvalidDuration { duration: u32 },

    #[error("Rate generator lists the {duration}-month tier more than once")]
    DuplicateDuration { duration: u32 },
}

/// Price a deck site.
///
/// Returns `Ok(None)` for a site without a price; a non-numeric price is an
/// error.
pub fn price_site(site: &DeckSite, ctx: &PricingContext<'_>) -> Result<Option<SitePricing>, PricingError> {
    let base: Option<Decimal> = site
        .site
        .base_price()
        .map_err(|_| PricingError::MalformedPrice {
            site_code: site.site_code().to_string(),
            raw: site.site.price.clone().unwrap_or_default(),
        })?;

    Ok(base.map(|price| compute_site_pricing(price, site.site_code(), ctx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::site::fixtures::deck_site;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pricing_error_display() {
        let err = PricingError::MalformedPrice {
            site_code: "MKT-1".to_string(),
            raw: "abc".to_string(),
        };
        assert!(err.to_string().contains("MKT-1"));

        let err = PricingError::ZeroExchangeRate {
            currency: "USD".to_string(),
        };
        assert!(err.to_string().contains("USD"));
    }

    #[test]
    fn test_price_site() {
        let ctx = PricingContext::default();
        let priced = price_site(&deck_site("A", Some("1,000")), &ctx).unwrap().unwrap();
        assert_eq!(priced.monthly, dec!(1000));

        assert_eq!(price_site(&deck_site("A", None), &ctx).unwrap(), None);
        assert!(matches!(
            price_site(&deck_site("A", Some("n/a")), &ctx),
            Err(PricingError::MalformedPrice { .. })
        ));
    }
}
