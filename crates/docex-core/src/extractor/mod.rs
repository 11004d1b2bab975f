//! LLM-backed field extraction.
//!
//! Builds the prompt, calls the model service once, parses the answer, maps
//! field names onto the expected set and attributes values to pages.

mod normalize;
mod prompt;
mod response;

pub use normalize::{FuzzyMatcher, PartialRatioMatcher, normalize_names};
pub use prompt::{SYSTEM_PROMPT, build_instructions, build_user_message, truncate_chars};
pub use response::{ParsedResponse, UnusableReason, parse_response};

use tracing::{debug, warn};

use crate::error::ModelError;
use crate::llm::ModelService;
use crate::models::config::ExtractionConfig;
use crate::models::{DocType, ExtractionResult, Field, Page, Source};

/// Field extractor over a model service and a name matcher.
pub struct FieldExtractor<M, F = PartialRatioMatcher> {
    model: M,
    matcher: F,
    config: ExtractionConfig,
}

impl<M: ModelService> FieldExtractor<M> {
    /// Create an extractor with the default partial-ratio matcher.
    pub fn new(model: M, config: ExtractionConfig) -> Self {
        Self {
            model,
            matcher: PartialRatioMatcher,
            config,
        }
    }
}

impl<M: ModelService, F: FuzzyMatcher> FieldExtractor<M, F> {
    /// Swap the field-name matcher.
    pub fn with_matcher<G: FuzzyMatcher>(self, matcher: G) -> FieldExtractor<M, G> {
        FieldExtractor {
            model: self.model,
            matcher,
            config: self.config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract fields from a document.
    ///
    /// An empty document still goes to the model so it can report missing
    /// fields as nulls. Only a failing model call is an error; unusable output
    /// gives an empty field list.
    pub async fn extract_fields(
        &self,
        doc_type: DocType,
        pages: &[Page],
        plain_text: &str,
        expected_fields: Option<&[String]>,
    ) -> Result<ExtractionResult, ModelError> {
        let expected_fields = expected_fields.filter(|f| !f.is_empty());

        let instructions = build_instructions(doc_type, expected_fields);
        let user_message =
            build_user_message(&instructions, plain_text, self.config.max_prompt_chars);

        let raw = self.model.complete(SYSTEM_PROMPT, &user_message).await?;

        let mut fields = match parse_response(&raw) {
            ParsedResponse::Fields(fields) => fields,
            ParsedResponse::Unusable(reason) => {
                warn!(%reason, response_len = raw.len(), "Model output unusable, continuing with no fields");
                Vec::new()
            }
        };

        if let Some(expected) = expected_fields {
            normalize_names(&mut fields, expected, &self.matcher, self.config.name_match_threshold);
        }

        attribute_sources(&mut fields, pages);

        debug!(%doc_type, fields = fields.len(), "Extraction complete");

        Ok(ExtractionResult::unscored(doc_type, fields))
    }
}

/// Point each field at the first page whose text contains its value verbatim.
///
/// Fields with null or empty values, or values found on no page, get an
/// empty source.
pub fn attribute_sources(fields: &mut [Field], pages: &[Page]) {
    for field in fields.iter_mut() {
        field.source = Source::default();

        let Some(value) = field.value_text() else {
            continue;
        };
        let needle = value.trim();
        if needle.is_empty() {
            continue;
        }

        if let Some(page) = pages.iter().find(|p| p.text.contains(needle)) {
            field.source = Source::page(page.page_no);
        }
    }
}
