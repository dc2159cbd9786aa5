//! Site selection and filtering

pub mod filters;
pub mod sort;
pub mod store;

pub use filters::{
    haversine_km, AvailabilityFilter, PriceRange, SiteFilters, AVAILABILITY_WINDOW_DAYS, LANDMARK_RADIUS_KM,
};
pub use sort::natural_cmp;
pub use store::SelectionStore;
