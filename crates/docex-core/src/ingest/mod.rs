//! Document ingestion: turns an input file into pages and plain text.

mod pdf;
#[cfg(feature = "ocr")]
mod ocr;

pub use pdf::PdfExtractor;
#[cfg(feature = "ocr")]
pub use ocr::OnnxOcrEngine;

use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::models::config::{DocexConfig, PdfConfig};
use crate::models::{LoadedDocument, Page, TextBox};

/// Ingestion collaborator used by the pipeline.
pub trait DocumentLoader: Send + Sync {
    /// Load pages (ordered from 1) and their concatenated text.
    fn load(&self, path: &Path) -> Result<LoadedDocument, IngestError>;
}

/// Text and boxes recognized on one image.
#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub text: String,
    pub boxes: Vec<TextBox>,
}

/// An OCR engine.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput, IngestError>;
}

/// Image extensions routed to OCR.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif", "bmp", "webp"];

/// Whether [`FileLoader`] knows how to ingest this path, by extension.
pub fn is_supported(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    matches!(extension.as_str(), "pdf" | "txt") || IMAGE_EXTENSIONS.contains(&extension.as_str())
}

/// Loader for PDF, image and plain text files.
pub struct FileLoader {
    ocr: Option<Box<dyn OcrBackend>>,
    pdf: PdfConfig,
}

impl FileLoader {
    /// Loader without OCR: digital PDFs and text files only.
    pub fn new() -> Self {
        Self {
            ocr: None,
            pdf: PdfConfig::default(),
        }
    }

    /// Build a loader from configuration, loading OCR models if configured.
    pub fn from_config(config: &DocexConfig) -> Result<Self, IngestError> {
        let mut loader = Self::new();
        loader.pdf = config.pdf.clone();

        if let Some(model_dir) = &config.ocr.model_dir {
            #[cfg(feature = "ocr")]
            {
                loader.ocr = Some(Box::new(OnnxOcrEngine::from_dir(model_dir, &config.ocr)?));
            }
            #[cfg(not(feature = "ocr"))]
            warn!(
                "OCR model directory {} configured but built without the ocr feature",
                model_dir.display()
            );
        }

        Ok(loader)
    }

    /// Use a specific OCR engine.
    pub fn with_ocr(mut self, ocr: impl OcrBackend + 'static) -> Self {
        self.ocr = Some(Box::new(ocr));
        self
    }

    fn ocr(&self) -> Result<&dyn OcrBackend, IngestError> {
        self.ocr.as_deref().ok_or_else(|| {
            IngestError::OcrUnavailable("no OCR model directory configured".to_string())
        })
    }

    fn load_pdf(&self, data: &[u8]) -> Result<LoadedDocument, IngestError> {
        let mut extractor = PdfExtractor::new();
        extractor.load(data)?;

        let document = LoadedDocument::from_pages(extractor.extract_pages()?);
        if document.plain_text.trim().chars().count() >= self.pdf.min_text_length {
            return Ok(document);
        }

        let Some(ocr) = self.ocr.as_deref() else {
            warn!("PDF has no embedded text and OCR is not configured");
            return Ok(document);
        };

        info!("PDF has no embedded text, running OCR on page images");
        let mut pages = Vec::with_capacity(document.pages.len());
        for page in document.pages {
            let mut text = Vec::new();
            let mut boxes = Vec::new();
            for image in extractor.extract_images(page.page_no)? {
                let output = ocr.recognize(&image)?;
                text.push(output.text);
                boxes.extend(output.boxes);
            }
            pages.push(Page::new(page.page_no, text.join("\n")).with_boxes(boxes));
        }

        Ok(LoadedDocument::from_pages(pages))
    }

    fn load_image(&self, data: &[u8]) -> Result<LoadedDocument, IngestError> {
        let ocr = self.ocr()?;
        let image = image::load_from_memory(data)?;
        let output = ocr.recognize(&image)?;
        Ok(LoadedDocument::from_pages(vec![
            Page::new(1, output.text).with_boxes(output.boxes),
        ]))
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<LoadedDocument, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let data = std::fs::read(path).map_err(|source| IngestError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let document = match extension.as_str() {
            "pdf" => self.load_pdf(&data)?,
            "txt" => {
                let text = String::from_utf8_lossy(&data).into_owned();
                LoadedDocument::from_pages(vec![Page::new(1, text)])
            }
            ext if IMAGE_EXTENSIONS.contains(&ext) => self.load_image(&data)?,
            other => return Err(IngestError::UnsupportedFormat(other.to_string())),
        };

        debug!(
            path = %path.display(),
            pages = document.pages.len(),
            chars = document.plain_text.len(),
            "Loaded document"
        );

        Ok(document)
    }
}
