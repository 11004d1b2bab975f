//! Configuration structures for the extraction pipeline.
//!
//! Loaded once at startup and treated as immutable afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the docex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocexConfig {
    /// Model service configuration.
    pub llm: LlmConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,
}

/// OpenAI-compatible chat completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the API (without `/chat/completions`).
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens in the completion.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-oss-120b".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            temperature: 0.3,
            max_tokens: 2048,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum number of document characters sent to the model.
    pub max_prompt_chars: usize,

    /// Minimum fuzzy score (0 - 100, exclusive) for renaming a field.
    pub name_match_threshold: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: 30_000,
            name_match_threshold: 70.0,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory with `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    /// OCR is disabled when unset.
    pub model_dir: Option<PathBuf>,

    /// Keep `[UNK]` tokens in recognized text.
    pub keep_unk: bool,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum text length to consider a PDF text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { min_text_length: 1 }
    }
}

impl DocexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
