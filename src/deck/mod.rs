//! Deck generation: options, session state, slide layout and PDF output.

pub mod assets;
pub mod composer;
pub mod layout;
pub mod options;
pub mod progress;
pub mod serializer;
pub mod session;

pub use composer::{generate_deck, ComposerState, DeckComposer};
pub use layout::{compose_slide, PriceDisplay, Slide, SlideElement, SlideError};
pub use options::{DeckOptions, DisplayOptions, OptionsStore};
pub use progress::{GenerationProgress, GenerationStatus, ProgressGuard};
pub use serializer::{serialize_deck, DeckArtifact, PDF_MIME};
pub use session::{DeckSession, DeckSnapshot};

/// Deck generation error
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("slide {index} ({site_code}) could not be composed: {reason}")]
    Composition {
        index: usize,
        site_code: String,
        reason: SlideError,
    },

    #[error("PDF serialization failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),
}
