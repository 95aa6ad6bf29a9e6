//! Annotation model for a paginated document viewer.
//!
//! The document is only a page count, a per-page geometry query and a save
//! hook; everything else here is the annotation store layered on top of it.

pub mod annotation;
pub mod document;
pub mod error;
pub mod source;
pub mod store;

pub use annotation::{
    Annotation, AnnotationBody, AnnotationId, AnnotationKind, AnnotationPatch, AnnotationStyle,
    Color, PageCoordinate, Rect, ShapeKind, COMMENT_ICON_SIZE, MIN_DRAWING_POINTS, MIN_RECT_SPAN,
};
pub use document::{Document, SaveStatus};
pub use error::{CollaboratorError, Rejection, SaveError};
pub use source::{AnnotationSerializer, PageSize, PageSource, TextSearch};
pub use store::AnnotationStore;
