use crate::annotation::AnnotationId;

/// Why the store refused to persist an annotation.
///
/// Rejections are ordinary outcomes, not failures: the caller decides whether
/// the user should hear about them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("rectangle {width}x{height} is below the minimum span")]
    RectTooSmall { width: f32, height: f32 },
    #[error("arrow of length {length} is below the minimum span")]
    ArrowTooShort { length: f32 },
    #[error("drawing has {count} point(s), at least 2 are required")]
    TooFewPoints { count: usize },
    #[error("text payload is empty")]
    EmptyText,
    #[error("annotation {0} already exists")]
    DuplicateId(AnnotationId),
    #[error("annotation {id} is stored on page {page}")]
    PageMismatch { id: AnnotationId, page: u32 },
}

/// Errors surfaced by save and save-as.
///
/// A failed save never touches the in-memory annotations or the dirty flag.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("annotation {id} on page {page} cannot be represented: {reason}")]
    Unrepresentable { page: u32, id: AnnotationId, reason: String },
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Failure reported by an external collaborator (renderer, text extractor).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("render failed for page {page}: {reason}")]
    Render { page: u32, reason: String },
    #[error("text extraction failed for page {page}: {reason}")]
    TextExtraction { page: u32, reason: String },
}
