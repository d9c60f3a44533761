//! POST /analyze, multipart upload of a job description and resumes.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::Document;
use crate::pipeline::DocumentReport;
use crate::state::AppState;

const JOB_DESCRIPTION_FIELD: &str = "jobDescription";
const FILES_FIELD: &str = "files[]";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub results: Vec<DocumentReport>,
}

/// POST /analyze
///
/// Reads `jobDescription` and every `files[]` part, then runs the batch.
/// Unknown fields are ignored.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut job_description = String::new();
    let mut documents = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            JOB_DESCRIPTION_FIELD => job_description = field.text().await?,
            FILES_FIELD => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                documents.push(Document {
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    info!(
        "Analyze request: {} file part(s), job description {} chars",
        documents.len(),
        job_description.trim().chars().count()
    );

    let results = state.pipeline.run(&job_description, documents).await?;
    Ok(Json(AnalyzeResponse { results }))
}
