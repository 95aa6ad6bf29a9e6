//! Collaborator seams: page geometry and rendering, text lookup and the
//! annotation serializer used by save.

use crate::error::{CollaboratorError, SaveError};
use crate::store::AnnotationStore;
use serde::{Deserialize, Serialize};

/// Page size in document units (points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self { width_pt, height_pt }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self { width_pt: 612.0, height_pt: 792.0 }
    }
}

/// Paginated content the viewer displays.
pub trait PageSource {
    /// Rasterized page produced by [`PageSource::render`].
    type Image;

    fn page_count(&self) -> u32;

    /// Size of `page_index`. Pages out of range report [`PageSize::default`].
    fn page_dimensions(&self, page_index: u32) -> PageSize;

    fn render(&self, page_index: u32, scale: f32) -> Result<Self::Image, CollaboratorError>;
}

/// Case-insensitive substring lookup over page text.
pub trait TextSearch {
    fn page_contains(&self, page_index: u32, term: &str) -> Result<bool, CollaboratorError>;
}

/// Writes the document's saved form with every stored annotation applied.
///
/// Implementations must fail with [`SaveError::Unrepresentable`] rather than
/// silently dropping an annotation they cannot express.
pub trait AnnotationSerializer {
    fn apply_and_serialize(
        &self,
        pages: &[PageSize],
        store: &AnnotationStore,
    ) -> Result<Vec<u8>, SaveError>;
}
