//! An open document: its page source plus the annotations layered on it.

use crate::annotation::Annotation;
use crate::error::{Rejection, SaveError};
use crate::source::{AnnotationSerializer, PageSize, PageSource};
use crate::store::AnnotationStore;
use std::io::Write;

/// Outcome of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing changed since the last save, so nothing was written.
    Unchanged,
    Written { bytes: usize },
}

#[derive(Debug)]
pub struct Document<S> {
    source: S,
    store: AnnotationStore,
}

impl<S: PageSource> Document<S> {
    pub fn new(source: S) -> Self {
        let store = AnnotationStore::new(source.page_count());
        Self { source, store }
    }

    /// Open with previously saved annotations restored.
    pub fn with_annotations(
        source: S,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Result<Self, Rejection> {
        let mut document = Self::new(source);
        document.store.restore(annotations)?;
        Ok(document)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page_count(&self) -> u32 {
        self.source.page_count()
    }

    pub fn page_dimensions(&self, page_index: u32) -> PageSize {
        self.source.page_dimensions(page_index)
    }

    /// Sizes of every page, in page order.
    pub fn page_geometry(&self) -> Vec<PageSize> {
        (0..self.page_count()).map(|page| self.source.page_dimensions(page)).collect()
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn annotations_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.has_unsaved_changes()
    }

    /// Write the saved form if anything changed since the last save.
    pub fn save(
        &mut self,
        serializer: &dyn AnnotationSerializer,
        out: &mut dyn Write,
    ) -> Result<SaveStatus, SaveError> {
        self.save_with(serializer, false, |bytes| write_flushed(out, bytes))
    }

    /// Write the saved form unconditionally.
    pub fn save_as(
        &mut self,
        serializer: &dyn AnnotationSerializer,
        out: &mut dyn Write,
    ) -> Result<SaveStatus, SaveError> {
        self.save_with(serializer, true, |bytes| write_flushed(out, bytes))
    }

    /// Serialize the annotations and hand the bytes to `commit`.
    ///
    /// Without `force`, a clean document is not serialized at all. The dirty
    /// flag is cleared only once `commit` reports the bytes durably stored.
    pub fn save_with<E, F>(
        &mut self,
        serializer: &dyn AnnotationSerializer,
        force: bool,
        commit: F,
    ) -> Result<SaveStatus, E>
    where
        E: From<SaveError>,
        F: FnOnce(&[u8]) -> Result<(), E>,
    {
        if !force && !self.store.has_unsaved_changes() {
            return Ok(SaveStatus::Unchanged);
        }

        let bytes = serializer.apply_and_serialize(&self.page_geometry(), &self.store)?;
        commit(&bytes)?;

        self.store.mark_saved();
        log::debug!("saved {} annotation(s), {} bytes", self.store.len(), bytes.len());
        Ok(SaveStatus::Written { bytes: bytes.len() })
    }
}

fn write_flushed(out: &mut dyn Write, bytes: &[u8]) -> Result<(), SaveError> {
    out.write_all(bytes)?;
    out.flush()?;
    Ok(())
}
