use async_trait::async_trait;
use pagebrief_common::Result;
use std::path::Path;

use crate::types::PageText;

/// Common trait for document text extractors
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the ordered page texts of the document at `path`
    ///
    /// Fails with an extraction error when the file is not a valid document
    /// of the expected format or has no pages at all.
    async fn extract(&self, path: &Path) -> Result<Vec<PageText>>;

    /// File extension (lowercase, without the dot) this extractor accepts
    fn extension(&self) -> &'static str;
}
