//! Database queries for the site, booking, landmark and deck sources

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Booking, Deck, DeckSummary, Landmark, Site, SiteContract};

/// Get every reference site
pub async fn get_sites(pool: &PgPool) -> Result<Vec<Site>> {
    let sites = sqlx::query_as::<_, Site>(
        r#"
        SELECT
            structure_code,
            site_code,
            city,
            address,
            latitude,
            longitude,
            size,
            facing,
            bound,
            traffic_count,
            population,
            price,
            created_at
        FROM sites
        WHERE deleted_at IS NULL
        ORDER BY site_code
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(sites)
}

/// Get contract end dates for sites under an open contract
pub async fn get_site_contracts(pool: &PgPool) -> Result<Vec<SiteContract>> {
    let contracts = sqlx::query_as::<_, SiteContract>(
        r#"
        SELECT
            site_code,
            end_date,
            adjusted_end_date
        FROM site_contracts
        WHERE status <> 'CLOSED'
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(contracts)
}

/// Get bookings that still count towards availability
pub async fn get_active_bookings(pool: &PgPool) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            site_code,
            booking_status,
            date_from,
            date_to
        FROM bookings
        WHERE booking_status <> 'CANCELLED'
        ORDER BY site_code, date_from
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

/// Get all landmarks
pub async fn get_landmarks(pool: &PgPool) -> Result<Vec<Landmark>> {
    let landmarks = sqlx::query_as::<_, Landmark>(
        r#"
        SELECT name, latitude, longitude, types
        FROM landmarks
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(landmarks)
}

/// List saved decks, most recently modified first
pub async fn list_decks(pool: &PgPool) -> Result<Vec<DeckSummary>> {
    let decks = sqlx::query_as::<_, DeckSummary>(
        r#"
        SELECT id, title, token, thumbnail, modified_at
        FROM decks
        ORDER BY modified_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(decks)
}

/// Get a saved deck with its payload
pub async fn get_deck(pool: &PgPool, id: Uuid) -> Result<Deck> {
    let deck = sqlx::query_as::<_, Deck>(
        r#"
        SELECT id, title, token, thumbnail, payload, modified_at
        FROM decks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Deck {}", id)))?;

    Ok(deck)
}

/// Insert a deck and return the stored row
pub async fn insert_deck(
    pool: &PgPool,
    title: &str,
    token: &str,
    thumbnail: Option<&str>,
    payload: &serde_json::Value,
    modified_at: DateTime<Utc>,
) -> Result<Deck> {
    let deck = sqlx::query_as::<_, Deck>(
        r#"
        INSERT INTO decks (id, title, token, thumbnail, payload, modified_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, token, thumbnail, payload, modified_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(token)
    .bind(thumbnail)
    .bind(payload)
    .bind(modified_at)
    .fetch_one(pool)
    .await?;

    Ok(deck)
}

/// Delete a deck; `NotFound` when no row matched
pub async fn delete_deck(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM decks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Deck {}", id)));
    }

    Ok(())
}
