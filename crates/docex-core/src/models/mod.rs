//! Data models shared by every pipeline stage.

pub mod config;
pub mod document;
pub mod extraction;

pub use config::DocexConfig;
pub use document::{LoadedDocument, Page, TextBox};
pub use extraction::{DocType, ExtractionResult, Field, FieldValue, QaReport, Source};
