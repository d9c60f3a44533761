use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::extraction::ExtractionStrategy;

/// Layout-aware extraction via `pdf-extract`. Keeps reading order and line
/// breaks closest to what the page shows, so it runs first.
pub struct LayoutTextStrategy;

impl ExtractionStrategy for LayoutTextStrategy {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, path: &Path) -> Result<String> {
        pdf_extract::extract_text(path).map_err(|e| anyhow!("pdf-extract: {e}"))
    }
}

/// Page-by-page content stream extraction via `lopdf`.
///
/// Simpler than the layout pass but tolerates documents whose font tables
/// the layout pass cannot resolve. Pages are joined with a blank line.
pub struct PageStreamStrategy;

impl ExtractionStrategy for PageStreamStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let doc = lopdf::Document::load(path).context("lopdf could not load document")?;

        let mut pages = Vec::new();
        // BTreeMap keys: page numbers in document order.
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        pages.push(text.to_string());
                    }
                }
                Err(e) => debug!("lopdf skipped page {page_number}: {e}"),
            }
        }

        Ok(pages.join("\n\n"))
    }
}
