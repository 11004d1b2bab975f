//! OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::IngestError;
use crate::models::TextBox;
use crate::models::config::OcrConfig;

use super::{OcrBackend, OcrOutput};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct OnnxOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl OnnxOcrEngine {
    /// Create an engine from model files in a directory.
    pub fn from_dir(model_dir: &Path, config: &OcrConfig) -> Result<Self, IngestError> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| IngestError::OcrUnavailable(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }
}

impl OcrBackend for OnnxOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput, IngestError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        debug!("Running OCR on {}x{} image", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| IngestError::Ocr(format!("pure-onnx-ocr: {}", e)))?;

        let mut boxes: Vec<TextBox> = results
            .iter()
            .map(|r| TextBox {
                text: if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
                bbox: polygon_to_rect(&r.bounding_box),
            })
            .filter(|b| !b.text.trim().is_empty())
            .collect();

        sort_reading_order(&mut boxes);

        let text = boxes
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        info!(
            "OCR complete: {} text boxes in {}ms",
            boxes.len(),
            start.elapsed().as_millis()
        );

        Ok(OcrOutput { text, boxes })
    }
}

/// Top-to-bottom in 20px rows, then left-to-right.
pub(crate) fn sort_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by_key(|b| (b.bbox[1] / 20, b.bbox[0]));
}

/// Axis-aligned integer rectangle around the polygon's exterior.
fn polygon_to_rect(polygon: &pure_onnx_ocr::Polygon<f64>) -> [i32; 4] {
    let mut rect = [i32::MAX, i32::MAX, i32::MIN, i32::MIN];
    for coord in polygon.exterior().coords() {
        rect[0] = rect[0].min(coord.x.floor() as i32);
        rect[1] = rect[1].min(coord.y.floor() as i32);
        rect[2] = rect[2].max(coord.x.ceil() as i32);
        rect[3] = rect[3].max(coord.y.ceil() as i32);
    }
    if rect[0] > rect[2] {
        return [0; 4];
    }
    rect
}
