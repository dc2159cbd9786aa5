//! Sequential slide composition and the end-to-end generation run.

use chrono::NaiveDate;
use tracing::{error, info};

use super::layout::{compose_slide, Slide};
use super::progress::GenerationProgress;
use super::serializer::{serialize_deck, DeckArtifact};
use super::session::DeckSnapshot;
use super::DeckError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerState {
    Idle,
    Composing { index: usize, site_code: String },
    Done,
    Failed,
}

/// Composes one slide per selected site, strictly in selection order
pub struct DeckComposer<'a> {
    snapshot: &'a DeckSnapshot,
    today: NaiveDate,
    state: ComposerState,
}

impl<'a> DeckComposer<'a> {
    pub fn new(snapshot: &'a DeckSnapshot, today: NaiveDate) -> Self {
        Self {
            snapshot,
            today,
            state: ComposerState::Idle,
        }
    }

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    /// Compose every slide, calling `on_slide(done, total)` after each one.
    ///
    /// Yields to the scheduler between slides. The first failing slide ends
    /// the run.
    pub async fn run(&mut self, mut on_slide: impl FnMut(usize, usize)) -> Result<Vec<Slide>, DeckError> {
        let snapshot = self.snapshot;
        let total = snapshot.sites.len();
        let mut slides = Vec::with_capacity(total);

        for (index, site) in snapshot.sites.iter().enumerate() {
            self.state = ComposerState::Composing {
                index,
                site_code: site.site_code().to_string(),
            };

            let slide = compose_slide(site, &snapshot.options, snapshot.apply_to_all, self.today)
                .map_err(|reason| {
                    self.state = ComposerState::Failed;
                    DeckError::Composition {
                        index,
                        site_code: site.site_code().to_string(),
                        reason,
                    }
                })?;
            slides.push(slide);
            on_slide(index + 1, total);

            tokio::task::yield_now().await;
        }

        self.state = ComposerState::Done;
        Ok(slides)
    }
}

/// Generate the deck for a snapshot.
///
/// Returns `Ok(None)` without doing anything when there is no snapshot.
/// Progress is reported on `progress` and reset to idle on every exit path.
pub async fn generate_deck(
    snapshot: Option<DeckSnapshot>,
    title: &str,
    filename: &str,
    today: NaiveDate,
    progress: &GenerationProgress,
) -> Result<Option<DeckArtifact>, DeckError> {
    let Some(snapshot) = snapshot else {
        return Ok(None);
    };

    let guard = progress.begin(snapshot.sites.len());
    let mut composer = DeckComposer::new(&snapshot, today);
    let slides = composer.run(|done, _| guard.advance(done)).await?;

    let bytes = serialize_deck(&slides, title).map_err(|e| {
        error!("Failed to serialize deck {:?}: {}", title, e);
        e
    })?;
    info!("Generated deck {:?}: {} slides, {} bytes", title, slides.len(), bytes.len());

    Ok(Some(DeckArtifact {
        filename: filename.to_string(),
        bytes,
        slide_count: slides.len(),
    }))
}
