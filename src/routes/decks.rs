//! Saved decks and deck generation

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::cache::DECKS_KEY;
use crate::catalog;
use crate::db;
use crate::deck::{generate_deck, DeckArtifact, DeckComposer, DeckSession, GenerationStatus, PDF_MIME};
use crate::error::{AppError, Result};
use crate::models::{DeckPayload, DeckSummary};
use crate::AppState;

const UNTITLED: &str = "Untitled deck";

/// Body for saving a deck
#[derive(Debug, Deserialize)]
pub struct CreateDeckRequest {
    pub title: String,
    #[serde(flatten)]
    pub payload: DeckPayload,
}

/// Body for generating a deck without saving it
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub payload: DeckPayload,
}

struct SlidePreview {
    site_code: String,
    availability: String,
    lines: Vec<String>,
}

#[derive(Template)]
#[template(path = "deck/preview.html")]
struct DeckPreviewTemplate {
    title: String,
    slides: Vec<SlidePreview>,
    has_slides: bool,
}

/// Saved decks, most recent first
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<DeckSummary>>> {
    if let Some(cached) = state.cache.decks.get(DECKS_KEY).await {
        tracing::debug!("Cache HIT for deck listing");
        return Ok(Json((*cached).clone()));
    }
    tracing::debug!("Cache MISS for deck listing");

    let decks = db::list_decks(&state.db).await?;
    state
        .cache
        .decks
        .insert(DECKS_KEY.to_string(), Arc::new(decks.clone()))
        .await;
    Ok(Json(decks))
}

/// Save a deck configuration
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateDeckRequest>,
) -> Result<(StatusCode, Json<DeckSummary>)> {
    let session = DeckSession::from_payload(req.payload)?;
    let payload = session.to_payload();
    let title = match req.title.trim() {
        "" => UNTITLED,
        title => title,
    };

    let token = Uuid::new_v4().simple().to_string();
    let deck = db::insert_deck(
        &state.db,
        title,
        &token,
        payload.thumbnail().as_deref(),
        &serde_json::to_value(&payload).map_err(AppError::from_encoding)?,
        Utc::now(),
    )
    .await?;
    state.cache.invalidate_decks().await;
    tracing::info!("Saved deck {} ({} sites)", deck.id, payload.sites.len());

    Ok((StatusCode::CREATED, Json(deck.summary())))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    db::delete_deck(&state.db, id).await?;
    state.cache.invalidate_decks().await;
    tracing::info!("Deleted deck {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Generate a deck from a submitted configuration.
///
/// Responds `204 No Content` when there is nothing to generate.
pub async fn generate(State(state): State<AppState>, Json(req): Json<GenerateRequest>) -> Result<Response> {
    let title = req.title.unwrap_or_else(|| UNTITLED.to_string());
    let session = DeckSession::from_payload(req.payload)?;
    render_deck(&state, &session, &title).await
}

/// Generate a saved deck
pub async fn download(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    let deck = db::get_deck(&state.db, id).await?;
    let session = DeckSession::from_payload(deck.payload()?)?;
    render_deck(&state, &session, &deck.title).await
}

async fn render_deck(state: &AppState, session: &DeckSession, title: &str) -> Result<Response> {
    let artifact = generate_deck(
        session.snapshot(),
        title,
        &state.config.deck_filename,
        catalog::today(),
        &state.progress,
    )
    .await?;

    Ok(match artifact {
        Some(artifact) => attachment(artifact),
        None => {
            tracing::debug!("Nothing to generate for {:?}", title);
            StatusCode::NO_CONTENT.into_response()
        }
    })
}

fn attachment(artifact: DeckArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, PDF_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.filename),
            ),
        ],
        artifact.bytes,
    )
        .into_response()
}

/// HTML outline of a saved deck's slides
pub async fn preview(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Html<String>> {
    let deck = db::get_deck(&state.db, id).await?;
    let session = DeckSession::from_payload(deck.payload()?)?;

    let slides = match session.snapshot() {
        Some(snapshot) => DeckComposer::new(&snapshot, catalog::today())
            .run(|_, _| {})
            .await?
            .into_iter()
            .map(|slide| SlidePreview {
                lines: slide.outline(),
                site_code: slide.site_code,
                availability: slide.availability,
            })
            .collect(),
        None => Vec::new(),
    };

    let template = DeckPreviewTemplate {
        title: deck.title,
        has_slides: !slides.is_empty(),
        slides,
    };

    Ok(Html(template.render()?))
}

/// Current generation status
pub async fn status(State(state): State<AppState>) -> Json<GenerationStatus> {
    Json(state.progress.current())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_flattens_payload() {
        let req: GenerateRequest = serde_json::from_str(r#"{"sites": [], "apply_to_all": true}"#).unwrap();
        assert!(req.title.is_none());
        assert!(req.payload.apply_to_all);
        assert!(req.payload.options.is_none());
    }

    #[test]
    fn test_attachment_headers() {
        let response = attachment(DeckArtifact {
            filename: "sales-deck.pdf".to_string(),
            bytes: b"%PDF-1.5".to_vec(),
            slide_count: 0,
        });
        assert_eq!(response.headers()[header::CONTENT_TYPE], PDF_MIME);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"sales-deck.pdf\""
        );
    }

    #[test]
    fn test_preview_template_renders() {
        let html = DeckPreviewTemplate {
            title: "Q1 <Makati>".to_string(),
            slides: vec![SlidePreview {
                site_code: "MKT-01".to_string(),
                availability: "OPEN".to_string(),
                lines: vec!["MONTHLY RATE".to_string(), "PHP 1,000.00".to_string()],
            }],
            has_slides: true,
        }
        .render()
        .unwrap();

        assert!(html.contains("MKT-01"));
        assert!(html.contains("PHP 1,000.00"));
        assert!(html.contains("Q1 &lt;Makati&gt;"));
    }
}
