//! Postgres data sources

pub mod queries;

pub use queries::*;
