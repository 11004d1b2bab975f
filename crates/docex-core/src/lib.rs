//! Core library for structured field extraction from documents.
//!
//! This crate provides:
//! - Document ingestion (PDF text, OCR for scans and images, plain text)
//! - Keyword routing to a document type
//! - LLM-backed field extraction with fuzzy field-name normalization
//! - Rule-based validation (date/amount formats, subtotal + tax = total)
//! - Confidence scoring from validation outcomes

pub mod error;
pub mod extractor;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod router;
pub mod scorer;
pub mod validator;

pub use error::{DocexError, IngestError, ModelError, Result};
pub use extractor::{FieldExtractor, FuzzyMatcher, ParsedResponse, PartialRatioMatcher};
pub use ingest::{DocumentLoader, FileLoader, OcrBackend, PdfExtractor};
pub use llm::{ChatCompletionsClient, ModelService};
pub use models::{
    DocType, DocexConfig, ExtractionResult, Field, FieldValue, LoadedDocument, Page, QaReport,
    Source, TextBox,
};
pub use pipeline::Pipeline;
pub use router::detect_doc_type;
pub use scorer::score;
pub use validator::validate;
