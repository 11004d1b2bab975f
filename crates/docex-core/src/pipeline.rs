//! End-to-end pipeline: ingest, route, extract, validate, score.
//!
//! Each invocation is independent; the pipeline holds only immutable
//! collaborators, so one instance can serve concurrent documents.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::extractor::{FieldExtractor, FuzzyMatcher, PartialRatioMatcher};
use crate::ingest::{DocumentLoader, FileLoader};
use crate::llm::{ChatCompletionsClient, ModelService};
use crate::models::{DocType, DocexConfig, ExtractionResult, LoadedDocument};
use crate::router::detect_doc_type;
use crate::scorer::score;
use crate::validator::validate;

/// Document extraction pipeline.
pub struct Pipeline<M, L = FileLoader, F = PartialRatioMatcher> {
    loader: L,
    extractor: FieldExtractor<M, F>,
}

impl Pipeline<ChatCompletionsClient> {
    /// Pipeline over the configured chat completion endpoint and file loader.
    pub fn from_config(config: &DocexConfig) -> Result<Self> {
        let model = ChatCompletionsClient::from_config(&config.llm)?;
        Self::new(model, config)
    }
}

impl<M: ModelService> Pipeline<M> {
    /// Pipeline over a model service, with a file loader built from config.
    pub fn new(model: M, config: &DocexConfig) -> Result<Self> {
        Ok(Self {
            loader: FileLoader::from_config(config)?,
            extractor: FieldExtractor::new(model, config.extraction.clone()),
        })
    }
}

impl<M, L, F> Pipeline<M, L, F>
where
    M: ModelService,
    L: DocumentLoader,
    F: FuzzyMatcher,
{
    /// Assemble a pipeline from explicit collaborators.
    pub fn with_parts(loader: L, extractor: FieldExtractor<M, F>) -> Self {
        Self { loader, extractor }
    }

    /// Run the whole pipeline on a file.
    ///
    /// Ingestion and model failures propagate; no partial result is returned.
    #[instrument(skip_all, fields(path = %input_path.display()))]
    pub async fn run_pipeline(
        &self,
        input_path: &Path,
        expected_fields: Option<&[String]>,
        doc_type_hint: Option<DocType>,
    ) -> Result<ExtractionResult> {
        let document = self.loader.load(input_path)?;
        debug!(pages = document.pages.len(), "Ingestion complete");

        self.process_document(&document, expected_fields, doc_type_hint).await
    }

    /// Run routing, extraction, validation and scoring on a loaded document.
    pub async fn process_document(
        &self,
        document: &LoadedDocument,
        expected_fields: Option<&[String]>,
        doc_type_hint: Option<DocType>,
    ) -> Result<ExtractionResult> {
        let doc_type = match doc_type_hint {
            Some(hint) => hint,
            None => detect_doc_type(&document.plain_text),
        };
        debug!(%doc_type, hinted = doc_type_hint.is_some(), "Document type resolved");

        let extraction = self
            .extractor
            .extract_fields(doc_type, &document.pages, &document.plain_text, expected_fields)
            .await?;

        let qa = validate(&extraction, doc_type);
        let result = score(extraction, qa);

        info!(
            %doc_type,
            fields = result.fields.len(),
            overall_confidence = result.overall_confidence,
            failed_rules = result.qa.failed_rules.len(),
            "Extraction finished"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocexError, ModelError};
    use crate::models::Page;
    use crate::models::config::ExtractionConfig;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl ModelService for Canned {
        async fn complete(&self, _system: &str, user: &str) -> std::result::Result<String, ModelError> {
            assert!(user.contains("Document text:"));
            Ok(self.0.to_string())
        }
    }

    fn pipeline(answer: &'static str) -> Pipeline<Canned> {
        Pipeline::with_parts(
            FileLoader::new(),
            FieldExtractor::new(Canned(answer), ExtractionConfig::default()),
        )
    }

    fn document(text: &str) -> LoadedDocument {
        LoadedDocument::from_pages(vec![Page::new(1, text)])
    }

    #[tokio::test]
    async fn test_routes_when_no_hint() {
        let result = pipeline(r#"{"fields":[]}"#)
            .process_document(&document("Discharge summary"), None, None)
            .await
            .unwrap();
        assert_eq!(result.doc_type, DocType::MedicalBill);
        assert_eq!(result.overall_confidence, 0.0);
    }

    #[tokio::test]
    async fn test_hint_bypasses_router() {
        let result = pipeline(r#"{"fields":[]}"#)
            .process_document(&document("Invoice No: 1"), None, Some(DocType::Prescription))
            .await
            .unwrap();
        assert_eq!(result.doc_type, DocType::Prescription);
    }

    #[tokio::test]
    async fn test_empty_model_response() {
        let result = pipeline("")
            .process_document(&document("Invoice No: 1"), None, None)
            .await
            .unwrap();
        assert!(result.fields.is_empty());
        assert_eq!(result.overall_confidence, 0.0);
    }

    #[tokio::test]
    async fn test_ingestion_failure_propagates() {
        let err = pipeline("{}")
            .run_pipeline(Path::new("/nonexistent/input.pdf"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocexError::Ingest(_)));
    }
}
