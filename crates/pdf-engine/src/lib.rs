//! lopdf-backed page source: page geometry, page text, single-page export
//! and a placeholder rasterizer.

pub mod fixtures;

use doc_model::{CollaboratorError, PageSize, PageSource, TextSearch};
use image::{ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object};
use std::fs;
use std::path::{Path, PathBuf};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

const PAGE_BORDER: Rgba<u8> = Rgba([220, 220, 220, 255]);

/// Longest side of a rendered page, in pixels.
pub const MAX_RENDER_DIMENSION: u32 = 16_384;
/// Pixel budget of one rendered page (256 MiB of RGBA).
pub const MAX_RENDER_PIXELS: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("document has no pages")]
    NoPages,
    #[error("render scale must be a positive finite number, got {0}")]
    InvalidScale(f32),
    #[error("rendered page would be {width}x{height} pixels, above the render limit")]
    RenderTooLarge { width: f64, height: f64 },
}

/// An opened PDF.
#[derive(Debug)]
pub struct PdfDocument {
    doc: Document,
    /// lopdf page numbers (1-based), in page order.
    page_numbers: Vec<u32>,
    page_sizes: Vec<PageSize>,
}

impl PdfDocument {
    pub fn open(source: impl Into<OpenSource>) -> Result<Self, PdfEngineError> {
        let doc = match source.into() {
            OpenSource::Path(path) => Document::load_mem(&fs::read(path)?)?,
            OpenSource::Bytes(bytes) => Document::load_mem(&bytes)?,
        };

        if doc.is_encrypted() {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(PdfEngineError::NoPages);
        }

        let mut page_numbers = Vec::with_capacity(pages.len());
        let mut page_sizes = Vec::with_capacity(pages.len());
        for (number, object_id) in pages {
            let size = doc
                .get_dictionary(object_id)
                .ok()
                .and_then(|dict| media_box(&doc, dict))
                .unwrap_or_default();
            page_numbers.push(number);
            page_sizes.push(size);
        }

        log::debug!("opened PDF with {} page(s)", page_numbers.len());
        Ok(Self { doc, page_numbers, page_sizes })
    }

    pub fn page_size(&self, page_index: u32) -> Result<PageSize, PdfEngineError> {
        self.page_sizes.get(page_index as usize).copied().ok_or(self.out_of_range(page_index))
    }

    /// Text of one page as lopdf extracts it.
    pub fn page_text(&self, page_index: u32) -> Result<String, PdfEngineError> {
        let number = self.page_number(page_index)?;
        Ok(self.doc.extract_text(&[number])?)
    }

    /// White page with a thin border, sized to the page at `scale`.
    pub fn render_page(&self, page_index: u32, scale: f32) -> Result<RgbaImage, PdfEngineError> {
        let page_size = self.page_size(page_index)?;
        let (width, height) = render_dimensions(page_size, scale)?;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, PAGE_BORDER);
                image.put_pixel(x, height - 1, PAGE_BORDER);
            }
            for y in 0..height {
                image.put_pixel(0, y, PAGE_BORDER);
                image.put_pixel(width - 1, y, PAGE_BORDER);
            }
        }

        Ok(image)
    }

    /// One-page PDF holding a copy of page `page_index`.
    ///
    /// Every other page is dropped along with the objects only it used.
    pub fn page_pdf(&self, page_index: u32) -> Result<Vec<u8>, PdfEngineError> {
        let keep = self.page_number(page_index)?;
        let others: Vec<u32> =
            self.page_numbers.iter().copied().filter(|number| *number != keep).collect();

        let mut single = self.doc.clone();
        single.delete_pages(&others);
        single.prune_objects();

        let mut bytes = Vec::new();
        single.save_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Write page `page_index` alone to a new PDF at `path`.
    pub fn export_page(&self, page_index: u32, path: &Path) -> Result<(), PdfEngineError> {
        let bytes = self.page_pdf(page_index)?;
        fs::write(path, &bytes)?;
        log::debug!("exported page {page_index} to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn page_number(&self, page_index: u32) -> Result<u32, PdfEngineError> {
        self.page_numbers.get(page_index as usize).copied().ok_or(self.out_of_range(page_index))
    }

    fn out_of_range(&self, page_index: u32) -> PdfEngineError {
        PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: self.page_numbers.len() as u32,
        }
    }
}

/// Pixel size of a page rendered at `scale`, bounded by the render limits.
fn render_dimensions(page_size: PageSize, scale: f32) -> Result<(u32, u32), PdfEngineError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PdfEngineError::InvalidScale(scale));
    }

    let width = (f64::from(page_size.width_pt) * f64::from(scale)).round().max(1.0);
    let height = (f64::from(page_size.height_pt) * f64::from(scale)).round().max(1.0);
    let limit = f64::from(MAX_RENDER_DIMENSION);
    if !width.is_finite()
        || !height.is_finite()
        || width > limit
        || height > limit
        || width * height > MAX_RENDER_PIXELS as f64
    {
        return Err(PdfEngineError::RenderTooLarge { width, height });
    }

    Ok((width as u32, height as u32))
}

/// MediaBox of a page, inherited from its parents when absent.
fn media_box(doc: &Document, dict: &Dictionary) -> Option<PageSize> {
    if let Ok(object) = dict.get(b"MediaBox") {
        let array = match object {
            Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
            other => other.as_array().ok()?,
        };
        if array.len() != 4 {
            return None;
        }
        let x0 = array[0].as_float().ok()?;
        let y0 = array[1].as_float().ok()?;
        let x1 = array[2].as_float().ok()?;
        let y1 = array[3].as_float().ok()?;
        return Some(PageSize::new((x1 - x0).abs(), (y1 - y0).abs()));
    }

    let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
    media_box(doc, doc.get_dictionary(parent).ok()?)
}

impl PageSource for PdfDocument {
    type Image = RgbaImage;

    fn page_count(&self) -> u32 {
        self.page_numbers.len() as u32
    }

    fn page_dimensions(&self, page_index: u32) -> PageSize {
        self.page_size(page_index).unwrap_or_default()
    }

    fn render(&self, page_index: u32, scale: f32) -> Result<RgbaImage, CollaboratorError> {
        self.render_page(page_index, scale).map_err(|err| match err {
            PdfEngineError::PageOutOfRange { page, page_count } => {
                CollaboratorError::PageOutOfRange { page, page_count }
            }
            other => CollaboratorError::Render { page: page_index, reason: other.to_string() },
        })
    }
}

impl TextSearch for PdfDocument {
    fn page_contains(&self, page_index: u32, term: &str) -> Result<bool, CollaboratorError> {
        let text = self.page_text(page_index).map_err(|err| match err {
            PdfEngineError::PageOutOfRange { page, page_count } => {
                CollaboratorError::PageOutOfRange { page, page_count }
            }
            other => {
                CollaboratorError::TextExtraction { page: page_index, reason: other.to_string() }
            }
        })?;
        Ok(text.to_lowercase().contains(&term.to_lowercase()))
    }
}
