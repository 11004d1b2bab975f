//! Ingested document representation.

use serde::{Deserialize, Serialize};

/// A recognized text fragment with its axis-aligned bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    /// Recognized text content.
    pub text: String,

    /// OCR confidence (0.0 - 1.0), independent of model confidence.
    pub confidence: f32,

    /// Bounding box (x1, y1, x2, y2).
    pub bbox: [i32; 4],
}

/// One page of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed).
    pub page_no: u32,

    /// Raw page text.
    pub text: String,

    /// Text fragments; empty when the text was read directly instead of OCR'd.
    #[serde(default)]
    pub boxes: Vec<TextBox>,
}

impl Page {
    /// Create a page without text boxes.
    pub fn new(page_no: u32, text: impl Into<String>) -> Self {
        Self {
            page_no,
            text: text.into(),
            boxes: Vec::new(),
        }
    }

    /// Attach OCR text boxes.
    pub fn with_boxes(mut self, boxes: Vec<TextBox>) -> Self {
        self.boxes = boxes;
        self
    }
}

/// Output of the ingestion collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedDocument {
    /// Pages ordered by `page_no`, starting at 1.
    pub pages: Vec<Page>,

    /// Concatenation of all page texts.
    pub plain_text: String,
}

impl LoadedDocument {
    /// Build a document from pages, joining their texts with blank lines.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let plain_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self { pages, plain_text }
    }

    /// Whether any page carries non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.plain_text.trim().is_empty()
    }
}
