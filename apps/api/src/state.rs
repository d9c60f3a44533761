use crate::config::Config;
use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Document-to-verdict pipeline. Owns the extractor and the injected LLM client.
    pub pipeline: Pipeline,
    pub config: Config,
}
