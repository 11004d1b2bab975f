//! Error types for the docex-core library.
//!
//! Only collaborator failures are errors. Malformed model output, unparseable
//! values and missing cross-field inputs are recovered inside the pipeline and
//! surface through confidences and the QA report instead.

use thiserror::Error;

/// Main error type for the docex library.
#[derive(Error, Debug)]
pub enum DocexError {
    /// Document ingestion (PDF/image/text loading, OCR) failed.
    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// The model service call failed.
    #[error("model service error: {0}")]
    Model(#[from] ModelError),
}

/// Errors raised while turning an input file into pages.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Image decoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The file extension is not one we know how to ingest.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// An image needs OCR but no engine is configured.
    #[error("OCR engine not available: {0}")]
    OcrUnavailable(String),

    /// The OCR engine failed.
    #[error("OCR failed: {0}")]
    Ocr(String),
}

/// Errors from the external text-completion service.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The configured credential variable is not set.
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered without any completion choice.
    #[error("model service returned no choices")]
    EmptyResponse,
}

/// Result type for the docex library.
pub type Result<T> = std::result::Result<T, DocexError>;
