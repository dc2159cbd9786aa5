//! Pricing API routes

use axum::{routing::post, Json, Router};

use crate::deck::OptionsStore;
use crate::error::Result;
use crate::AppState;

use super::requests::QuoteRequest;
use super::responses::QuoteResponse;
use super::services::price_site;

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(quote))
}

/// Quote a single site under the supplied options.
///
/// Options pass through the same store as deck generation, so rate
/// generator tiers are validated and priced in ascending duration order.
async fn quote(Json(req): Json<QuoteRequest>) -> Result<Json<QuoteResponse>> {
    let store = OptionsStore::from_options(req.options)?;
    let ctx = store.options().pricing_context(req.apply_to_all);
    let pricing = price_site(&req.site, &ctx)?;
    tracing::debug!("Quoted site {}", req.site.site_code());

    Ok(Json(QuoteResponse::new(req.site.site_code(), pricing)))
}
