use async_trait::async_trait;
use pagebrief_common::{PageBriefError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::extractor::TextExtractor;
use crate::types::PageText;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// lopdf based PDF text extractor
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    timeout: Duration,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor {
    /// Create new PDF extractor
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the extraction timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn extract_pages(path: &Path) -> Result<Vec<PageText>> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| PageBriefError::extraction(format!("Failed to parse PDF: {}", e)))?;

        // BTreeMap keys are page numbers, already in order
        let pages = doc.get_pages();
        let mut records = Vec::with_capacity(pages.len());

        for (index, page_num) in pages.keys().enumerate() {
            let text = match doc.extract_text(&[*page_num]) {
                Ok(text) => text,
                Err(e) => {
                    warn!("No text recovered from page {}: {}", page_num, e);
                    String::new()
                }
            };
            records.push(PageText::new(index, text));
        }

        Ok(records)
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<PageText>> {
        let owned: PathBuf = path.to_path_buf();
        debug!("Extracting PDF text: {}", owned.display());

        let pages = tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || Self::extract_pages(&owned)),
        )
        .await
        .map_err(|_| PageBriefError::extraction("PDF extraction timed out"))?
        .map_err(|e| PageBriefError::internal(format!("Extraction task failed: {}", e)))??;

        if pages.is_empty() {
            return Err(PageBriefError::extraction("PDF has no pages"));
        }

        let with_text = pages.iter().filter(|p| p.has_text()).count();
        info!(
            "PDF text extraction complete - Pages: {}, With text: {}",
            pages.len(),
            with_text
        );

        Ok(pages)
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }
}
