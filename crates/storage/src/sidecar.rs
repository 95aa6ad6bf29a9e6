//! JSON annotation sidecar stored next to the document it belongs to.

use crate::StorageError;
use doc_model::{
    Annotation, AnnotationBody, AnnotationSerializer, AnnotationStore, PageCoordinate, PageSize,
    SaveError,
};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SIDECAR_EXTENSION: &str = "folio-annotations.json";

const SIDECAR_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct SidecarRef<'a> {
    version: u32,
    page_count: u32,
    annotations: Vec<&'a Annotation>,
}

#[derive(Deserialize)]
struct SidecarEnvelope {
    version: u32,
    annotations: Vec<Annotation>,
}

/// Serializes every annotation of a store as a versioned JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSidecar;

impl AnnotationSerializer for JsonSidecar {
    fn apply_and_serialize(
        &self,
        pages: &[PageSize],
        store: &AnnotationStore,
    ) -> Result<Vec<u8>, SaveError> {
        for annotation in store.iter() {
            check_representable(annotation, pages.len())?;
        }

        let envelope = SidecarRef {
            version: SIDECAR_SCHEMA_VERSION,
            page_count: pages.len() as u32,
            annotations: store.iter().collect(),
        };
        serde_json::to_vec_pretty(&envelope)
            .map_err(|err| SaveError::Serialization(err.to_string()))
    }
}

/// JSON has no encoding for NaN or infinities, so such geometry cannot round-trip.
fn check_representable(annotation: &Annotation, page_count: usize) -> Result<(), SaveError> {
    let unrepresentable = |reason: &str| SaveError::Unrepresentable {
        page: annotation.page_index(),
        id: annotation.id(),
        reason: reason.to_owned(),
    };

    if annotation.page_index() as usize >= page_count {
        return Err(unrepresentable("page is outside the document"));
    }

    let finite = |point: &PageCoordinate| point.x.is_finite() && point.y.is_finite();
    let geometry_ok = match annotation.body() {
        AnnotationBody::Highlight { rect } | AnnotationBody::Shape { rect, .. } => {
            finite(&rect.top_left()) && finite(&rect.bottom_right())
        }
        AnnotationBody::Text { position, .. } | AnnotationBody::Comment { position, .. } => {
            finite(position)
        }
        AnnotationBody::Drawing { points } => points.iter().all(finite),
    };
    let style = annotation.style();
    if !geometry_ok || !style.stroke_width.is_finite() || !style.font_size.is_finite() {
        return Err(unrepresentable("non-finite coordinate"));
    }
    Ok(())
}

/// Parse a sidecar previously written by [`JsonSidecar`].
pub fn load_annotations(bytes: &[u8]) -> Result<Vec<Annotation>, StorageError> {
    let envelope: SidecarEnvelope = serde_json::from_slice(bytes)?;
    if envelope.version != SIDECAR_SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion(envelope.version));
    }
    Ok(envelope.annotations)
}

/// `report.pdf` -> `report.pdf.folio-annotations.json`
pub fn sidecar_path(document_path: &Path) -> PathBuf {
    let mut name = document_path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    document_path.with_file_name(name)
}

/// Annotations saved for `document_path`; empty when there is no sidecar.
pub fn load_sidecar(document_path: &Path) -> Result<Vec<Annotation>, StorageError> {
    let path = sidecar_path(document_path);
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_annotations(&fs::read(path)?)
}

/// Replace the sidecar of `document_path` with `bytes`, atomically.
///
/// The bytes go to a temporary file that is synced and renamed over the
/// sidecar. On failure the temporary file is removed and the old sidecar
/// is left as it was.
pub fn write_sidecar(document_path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let path = sidecar_path(document_path);
    let temp_path = path.with_extension("json.tmp");

    let written = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, &path));
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{AnnotationStyle, Color, Document, PageSource, Rect, SaveStatus, ShapeKind};
    use tempfile::TempDir;

    struct Blank(u32);

    impl PageSource for Blank {
        type Image = ();

        fn page_count(&self) -> u32 {
            self.0
        }

        fn page_dimensions(&self, _page_index: u32) -> PageSize {
            PageSize::default()
        }

        fn render(&self, _page_index: u32, _scale: f32) -> Result<(), doc_model::CollaboratorError> {
            Ok(())
        }
    }

    fn annotated() -> Document<Blank> {
        let mut document = Document::new(Blank(2));
        let store = document.annotations_mut();
        store
            .add(
                0,
                AnnotationBody::Highlight { rect: Rect::new(10.0, 10.0, 80.0, 30.0) },
                AnnotationStyle::highlight(),
            )
            .expect("highlight");
        store
            .add(
                1,
                AnnotationBody::Shape {
                    rect: Rect::new(0.0, 0.0, 40.0, 40.0),
                    shape: ShapeKind::Oval,
                },
                AnnotationStyle::markup(Color::BLUE),
            )
            .expect("oval");
        document
    }

    #[test]
    fn sidecar_path_appends_extension() {
        assert_eq!(
            sidecar_path(Path::new("/docs/report.pdf")),
            PathBuf::from("/docs/report.pdf.folio-annotations.json")
        );
    }

    #[test]
    fn saved_annotations_restore_into_a_clean_store() {
        let mut document = annotated();
        let mut bytes = Vec::new();
        document.save(&JsonSidecar, &mut bytes).expect("save should succeed");

        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("valid json");
        assert_eq!(json["version"], 1);
        assert_eq!(json["page_count"], 2);
        assert_eq!(json["annotations"][0]["id"], "0:1");
        assert_eq!(json["annotations"][1]["body"]["shape"], "oval");

        let annotations = load_annotations(&bytes).expect("sidecar should load");
        let reopened =
            Document::with_annotations(Blank(2), annotations).expect("restore should succeed");
        assert_eq!(reopened.annotations().len(), 2);
        assert!(!reopened.has_unsaved_changes());
        assert_eq!(reopened.annotations().list(1), document.annotations().list(1));
    }

    #[test]
    fn unknown_version_is_refused() {
        let bytes = br#"{"version": 9, "page_count": 1, "annotations": []}"#;
        assert!(matches!(load_annotations(bytes), Err(StorageError::UnsupportedVersion(9))));
    }

    #[test]
    fn non_finite_geometry_is_unrepresentable() {
        let mut document = Document::new(Blank(1));
        document
            .annotations_mut()
            .add(
                0,
                AnnotationBody::Text {
                    position: PageCoordinate::new(f32::NAN, 1.0),
                    text: "lost".into(),
                },
                AnnotationStyle::text(),
            )
            .expect("text is accepted by the store");

        let mut bytes = Vec::new();
        let err = document.save(&JsonSidecar, &mut bytes).expect_err("NaN cannot be saved");
        assert!(matches!(err, SaveError::Unrepresentable { page: 0, .. }));
        assert!(document.has_unsaved_changes());
    }

    #[test]
    fn sidecar_writes_atomically_and_skips_clean_documents() {
        let dir = TempDir::new().expect("temp dir");
        let pdf = dir.path().join("doc.pdf");
        let mut document = annotated();

        let status = document
            .save_with(&JsonSidecar, false, |bytes| write_sidecar(&pdf, bytes))
            .expect("save should succeed");
        assert!(matches!(status, SaveStatus::Written { .. }));
        assert_eq!(load_sidecar(&pdf).expect("load").len(), 2);

        let status = document
            .save_with(&JsonSidecar, false, |bytes| write_sidecar(&pdf, bytes))
            .expect("second save should succeed");
        assert_eq!(status, SaveStatus::Unchanged);
        assert!(!dir.path().join("doc.pdf.folio-annotations.json.tmp").exists());
    }

    #[test]
    fn failed_rename_keeps_annotations_unsaved() {
        let dir = TempDir::new().expect("temp dir");
        let pdf = dir.path().join("doc.pdf");
        let blocker = sidecar_path(&pdf);
        fs::create_dir(&blocker).expect("blocking directory");
        fs::write(blocker.join("occupied"), b"x").expect("blocking file");
        let mut document = annotated();

        let result = document.save_with(&JsonSidecar, false, |bytes| write_sidecar(&pdf, bytes));
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(document.has_unsaved_changes());
        assert!(!dir.path().join("doc.pdf.folio-annotations.json.tmp").exists());

        fs::remove_dir_all(&blocker).expect("unblock");
        let status = document
            .save_with(&JsonSidecar, false, |bytes| write_sidecar(&pdf, bytes))
            .expect("retry should succeed");
        assert!(matches!(status, SaveStatus::Written { .. }));
        assert!(!document.has_unsaved_changes());
        assert_eq!(load_sidecar(&pdf).expect("load").len(), 2);
    }

    #[test]
    fn missing_sidecar_loads_as_empty() {
        let dir = TempDir::new().expect("temp dir");
        assert!(load_sidecar(&dir.path().join("none.pdf")).expect("load").is_empty());
    }
}
