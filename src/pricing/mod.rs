//! Pricing engine module.
//!
//! Applies ordered price transformations to a site's base monthly rate:
//! adjustment, currency conversion, then the cascading rate generator.

pub mod calculators;
pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{
    apply_adjustment, compute_site_pricing, format_count, format_money, round_money, PricingContext, RateTier,
    SitePricing,
};
pub use models::{
    AdjustmentType, AllSites, ApplyTo, CurrencyExchange, Operation, PriceAdjustment, RateGeneratorEntry,
    BASE_CURRENCY, RATE_DURATIONS,
};
pub use routes::router;
pub use services::{price_site, PricingError};
