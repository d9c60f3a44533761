//! Pipeline orchestrator: Extract → Build Prompt → Call Model → Normalize, per document.
//!
//! Documents are processed one at a time in upload order. Each one runs in its
//! own task so that an error or a panic only ever lands in that document's entry.
//! Only the batch preconditions can fail the whole request.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::analysis::{AnalysisStrategy, CanonicalResult};
use crate::extraction::{Document, TextExtractor};
use crate::llm_client::{AnalysisClient, LlmError};

/// Failures that reject the whole batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Job description is required")]
    JobDescriptionRequired,

    #[error("No files uploaded")]
    NoFilesUploaded,

    #[error("No files selected")]
    NoFilesSelected,

    #[error("No valid PDF files processed")]
    NoValidPdfs,
}

/// Failures confined to a single document's entry.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Only PDF files are supported")]
    UnsupportedType,

    #[error("Could not extract text from PDF. Please make sure the PDF is not password protected and contains extractable text.")]
    Extraction,

    #[error("Missing job description or resume text")]
    MissingText,

    #[error("Error processing PDF: {0}")]
    Analysis(#[from] LlmError),

    #[error("Error processing PDF: unexpected failure while analyzing document")]
    Crashed,
}

/// One entry of the batch response, in upload order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub filename: String,
    #[serde(flatten)]
    pub outcome: DocumentOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocumentOutcome {
    Analyzed(CanonicalResult),
    Failed { error: String },
}

pub type BatchResult = Vec<DocumentReport>;

/// The document-to-verdict pipeline. Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct Pipeline {
    extractor: Arc<TextExtractor>,
    client: Arc<dyn AnalysisClient>,
    strategy: AnalysisStrategy,
}

impl Pipeline {
    pub fn new(
        extractor: TextExtractor,
        client: Arc<dyn AnalysisClient>,
        strategy: AnalysisStrategy,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            client,
            strategy,
        }
    }

    pub fn strategy(&self) -> AnalysisStrategy {
        self.strategy
    }

    /// Runs every document in the batch and reports one entry per named document.
    pub async fn run(
        &self,
        job_description: &str,
        documents: Vec<Document>,
    ) -> Result<BatchResult, BatchError> {
        let job_description = job_description.trim();
        if job_description.is_empty() {
            return Err(BatchError::JobDescriptionRequired);
        }
        if documents.is_empty() {
            return Err(BatchError::NoFilesUploaded);
        }
        if documents.iter().all(|d| d.name().is_none()) {
            return Err(BatchError::NoFilesSelected);
        }

        let job_description: Arc<str> = Arc::from(job_description);
        let mut results = Vec::with_capacity(documents.len());

        for document in documents {
            let Some(filename) = document.name().map(str::to_string) else {
                continue;
            };

            let outcome = match self.process_isolated(job_description.clone(), document).await {
                Ok(result) => {
                    info!(
                        "Analysis for {filename}: match={} ats={}",
                        result.match_percentage, result.ats_friendly_score
                    );
                    DocumentOutcome::Analyzed(result)
                }
                Err(e) => {
                    warn!("Failed to process {filename}: {e}");
                    DocumentOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            results.push(DocumentReport { filename, outcome });
        }

        if results.is_empty() {
            return Err(BatchError::NoValidPdfs);
        }

        Ok(results)
    }

    /// Processes one document in its own task; a panic becomes `DocumentError::Crashed`.
    async fn process_isolated(
        &self,
        job_description: Arc<str>,
        document: Document,
    ) -> Result<CanonicalResult, DocumentError> {
        let pipeline = self.clone();
        let task = tokio::spawn(async move { pipeline.process(&job_description, &document).await });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Document task aborted: {e}");
                Err(DocumentError::Crashed)
            }
        }
    }

    async fn process(
        &self,
        job_description: &str,
        document: &Document,
    ) -> Result<CanonicalResult, DocumentError> {
        if !document.has_pdf_extension() {
            return Err(DocumentError::UnsupportedType);
        }

        debug!(
            "Extracting {:?} ({} bytes, content type {:?})",
            document.filename,
            document.bytes.len(),
            document.content_type
        );

        let resume_text = self
            .extractor
            .extract(document)
            .await
            .into_text()
            .ok_or(DocumentError::Extraction)?;

        self.analyze(job_description, &resume_text).await
    }

    /// Prompt → model → normalize for already-extracted text.
    pub async fn analyze(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<CanonicalResult, DocumentError> {
        if job_description.trim().is_empty() || resume_text.trim().is_empty() {
            return Err(DocumentError::MissingText);
        }

        let system = self.strategy.system_prompt();
        let prompt = self.strategy.build_prompt(job_description, resume_text);

        info!("Sending prompt to API ({} strategy)", self.strategy);
        let raw = self.client.send(&system, &prompt).await?;

        let normalized = self.strategy.normalize(&raw);
        if normalized.is_degraded() {
            warn!("Model response did not follow the {} format; keeping raw text", self.strategy);
        }

        Ok(normalized.into_result())
    }
}
