//! Text Extractor — ordered fallback over PDF text extraction strategies.
//!
//! The upload is copied into a scratch file, each strategy runs against that
//! file in order, and the first non-blank result wins. The scratch file is a
//! `NamedTempFile`, so it is removed when extraction returns on every path.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

pub mod strategies;

use strategies::{LayoutTextStrategy, PageStreamStrategy};

const PREVIEW_CHARS: usize = 200;

/// An uploaded document. Immutable once received.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: Some(filename.into()),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// The declared filename, if it is non-empty.
    pub fn name(&self) -> Option<&str> {
        self.filename.as_deref().filter(|n| !n.is_empty())
    }

    /// Extension check only; the content is not sniffed.
    pub fn has_pdf_extension(&self) -> bool {
        self.name()
            .map(|n| n.to_lowercase().ends_with(".pdf"))
            .unwrap_or(false)
    }
}

/// Extracted text, or a failure. Blank text is never a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Text(String),
    Failed,
}

impl ExtractionResult {
    pub fn into_text(self) -> Option<String> {
        match self {
            ExtractionResult::Text(text) => Some(text),
            ExtractionResult::Failed => None,
        }
    }
}

/// One way of turning a PDF file into plain text.
///
/// Implementations may return errors or even panic; the extractor treats both
/// as "no text" and moves on to the next strategy.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, path: &Path) -> Result<String>;
}

#[derive(Clone)]
pub struct TextExtractor {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
    scratch_dir: PathBuf,
}

impl TextExtractor {
    /// Layout-aware extraction first, page-stream extraction second.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self::with_strategies(
            scratch_dir,
            vec![Arc::new(LayoutTextStrategy), Arc::new(PageStreamStrategy)],
        )
    }

    pub fn with_strategies(
        scratch_dir: impl Into<PathBuf>,
        strategies: Vec<Arc<dyn ExtractionStrategy>>,
    ) -> Self {
        Self {
            strategies,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Runs the strategy chain on the blocking pool.
    pub async fn extract(&self, document: &Document) -> ExtractionResult {
        let strategies = self.strategies.clone();
        let scratch_dir = self.scratch_dir.clone();
        let bytes = document.bytes.clone();

        match tokio::task::spawn_blocking(move || extract_blocking(&scratch_dir, &bytes, &strategies))
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!("PDF text extraction task failed: {e}");
                ExtractionResult::Failed
            }
        }
    }
}

fn extract_blocking(
    scratch_dir: &Path,
    bytes: &[u8],
    strategies: &[Arc<dyn ExtractionStrategy>],
) -> ExtractionResult {
    let scratch = match write_scratch_copy(scratch_dir, bytes) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to save uploaded file: {e:#}");
            return ExtractionResult::Failed;
        }
    };

    for strategy in strategies {
        if let Some(text) = run_strategy(strategy.as_ref(), scratch.path()) {
            info!("Successfully extracted text using {}", strategy.name());
            debug!("Extracted text (first {PREVIEW_CHARS} chars): {}", preview(&text));
            return ExtractionResult::Text(text);
        }
    }

    warn!("All PDF text extraction methods failed");
    ExtractionResult::Failed
}

fn write_scratch_copy(scratch_dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile_in(scratch_dir)
        .with_context(|| format!("cannot create scratch file in {}", scratch_dir.display()))?;
    file.write_all(bytes).context("cannot write scratch file")?;
    file.flush().context("cannot flush scratch file")?;
    Ok(file)
}

/// Returns trimmed text, or `None` when the strategy failed, panicked or found nothing.
fn run_strategy(strategy: &dyn ExtractionStrategy, path: &Path) -> Option<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| strategy.extract(path))) {
        Ok(Ok(text)) => {
            let text = text.trim();
            if text.is_empty() {
                debug!("{} produced no text", strategy.name());
                None
            } else {
                Some(text.to_string())
            }
        }
        Ok(Err(e)) => {
            warn!("{} extraction failed: {e:#}", strategy.name());
            None
        }
        Err(_) => {
            warn!("{} extraction panicked", strategy.name());
            None
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Builds a one-page PDF that shows `text` in a standard font.
    pub(crate) fn sample_pdf(text: &str) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    struct Fixed {
        output: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(output: Option<&'static str>) -> (Arc<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Arc::new(Self {
                    output,
                    calls: calls.clone(),
                }),
                calls,
            )
        }
    }

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(&self, _path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("no text layer"))
        }
    }

    struct Panicking;

    impl ExtractionStrategy for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn extract(&self, _path: &Path) -> Result<String> {
            panic!("malformed xref table");
        }
    }

    /// Reads the scratch copy back, proving the bytes reached disk.
    struct ReadBack;

    impl ExtractionStrategy for ReadBack {
        fn name(&self) -> &'static str {
            "read-back"
        }

        fn extract(&self, path: &Path) -> Result<String> {
            Ok(std::fs::read_to_string(path)?)
        }
    }

    fn scratch_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    fn doc(bytes: &'static [u8]) -> Document {
        Document::new("resume.pdf", Bytes::from_static(bytes))
    }

    #[tokio::test]
    async fn test_first_non_empty_strategy_short_circuits() {
        let scratch = tempfile::tempdir().unwrap();
        let (first, first_calls) = Fixed::new(Some("  from layout  "));
        let (second, second_calls) = Fixed::new(Some("from stream"));
        let extractor = TextExtractor::with_strategies(scratch.path(), vec![first, second]);

        let result = extractor.extract(&doc(b"%PDF")).await;

        assert_eq!(result, ExtractionResult::Text("from layout".to_string()));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_first_strategy_falls_back_to_second() {
        let scratch = tempfile::tempdir().unwrap();
        let (first, _) = Fixed::new(Some(" \n\t "));
        let (second, second_calls) = Fixed::new(Some("from stream"));
        let extractor = TextExtractor::with_strategies(scratch.path(), vec![first, second]);

        let result = extractor.extract(&doc(b"%PDF")).await;

        assert_eq!(result, ExtractionResult::Text("from stream".to_string()));
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_and_panics_count_as_empty() {
        let scratch = tempfile::tempdir().unwrap();
        let (failing, _) = Fixed::new(None);
        let extractor = TextExtractor::with_strategies(
            scratch.path(),
            vec![Arc::new(Panicking), failing],
        );

        assert_eq!(extractor.extract(&doc(b"%PDF")).await, ExtractionResult::Failed);
        assert!(scratch_is_empty(scratch.path()));
    }

    #[tokio::test]
    async fn test_all_blank_strategies_fail() {
        let scratch = tempfile::tempdir().unwrap();
        let (first, _) = Fixed::new(Some(""));
        let (second, _) = Fixed::new(Some("   "));
        let extractor = TextExtractor::with_strategies(scratch.path(), vec![first, second]);

        assert_eq!(extractor.extract(&doc(b"%PDF")).await, ExtractionResult::Failed);
    }

    #[tokio::test]
    async fn test_scratch_copy_holds_upload_and_is_removed() {
        let scratch = tempfile::tempdir().unwrap();
        let extractor = TextExtractor::with_strategies(scratch.path(), vec![Arc::new(ReadBack)]);

        let result = extractor.extract(&doc(b"plain resume text")).await;

        assert_eq!(result, ExtractionResult::Text("plain resume text".to_string()));
        assert!(scratch_is_empty(scratch.path()));
    }

    #[tokio::test]
    async fn test_unwritable_scratch_dir_fails_extraction() {
        let scratch = tempfile::tempdir().unwrap();
        let missing = scratch.path().join("does-not-exist");
        let extractor = TextExtractor::with_strategies(missing, vec![Arc::new(ReadBack)]);

        assert_eq!(extractor.extract(&doc(b"text")).await, ExtractionResult::Failed);
    }

    #[tokio::test]
    async fn test_default_chain_extracts_real_pdf() {
        let scratch = tempfile::tempdir().unwrap();
        let extractor = TextExtractor::new(scratch.path());
        let document = Document::new("cv.pdf", sample_pdf("Hello World"));

        let text = extractor
            .extract(&document)
            .await
            .into_text()
            .expect("text layer should be extracted");

        assert!(text.contains("Hello World"), "got {text:?}");
        assert!(scratch_is_empty(scratch.path()));
    }

    #[tokio::test]
    async fn test_default_chain_fails_on_garbage() {
        let scratch = tempfile::tempdir().unwrap();
        let extractor = TextExtractor::new(scratch.path());

        let result = extractor
            .extract(&doc(b"this is definitely not a pdf file"))
            .await;

        assert_eq!(result, ExtractionResult::Failed);
        assert!(scratch_is_empty(scratch.path()));
    }

    #[tokio::test]
    async fn test_default_chain_fails_on_empty_upload() {
        let scratch = tempfile::tempdir().unwrap();
        let extractor = TextExtractor::new(scratch.path());

        assert_eq!(extractor.extract(&doc(b"")).await, ExtractionResult::Failed);
    }

    #[test]
    fn test_pdf_extension_check_is_case_insensitive() {
        assert!(Document::new("CV.PDF", Bytes::new()).has_pdf_extension());
        assert!(Document::new("cv.pdf", Bytes::new()).has_pdf_extension());
        assert!(!Document::new("cv.docx", Bytes::new()).has_pdf_extension());
        assert!(!Document::new("pdf", Bytes::new()).has_pdf_extension());
    }

    #[test]
    fn test_empty_filename_counts_as_unnamed() {
        let document = Document {
            filename: Some(String::new()),
            content_type: None,
            bytes: Bytes::new(),
        };
        assert_eq!(document.name(), None);
        assert!(!document.has_pdf_extension());
    }
}
