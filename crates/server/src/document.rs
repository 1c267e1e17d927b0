use async_trait::async_trait;
use pagebrief_common::{PageBriefError, Result};
use std::path::{Path, PathBuf};

/// What the transport tells us about an inbound document
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    /// Original filename
    pub file_name: String,

    /// Size in bytes as declared by the sender
    pub declared_size: u64,

    /// Transport-assigned unique identifier
    pub unique_id: String,
}

impl DocumentMeta {
    pub fn new(file_name: impl Into<String>, declared_size: u64, unique_id: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            declared_size,
            unique_id: unique_id.into(),
        }
    }
}

/// Inbound document whose content is retrieved on demand
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    fn meta(&self) -> &DocumentMeta;

    /// Write the document content to `dest`
    async fn download_to(&self, dest: &Path) -> Result<()>;
}

/// Document already held in memory (HTTP uploads)
pub struct InMemoryDocument {
    meta: DocumentMeta,
    bytes: Vec<u8>,
}

impl InMemoryDocument {
    pub fn new(meta: DocumentMeta, bytes: Vec<u8>) -> Self {
        Self { meta, bytes }
    }
}

#[async_trait]
impl DocumentHandle for InMemoryDocument {
    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    async fn download_to(&self, dest: &Path) -> Result<()> {
        tokio::fs::write(dest, &self.bytes).await?;
        Ok(())
    }
}

/// Document on the local filesystem (CLI runs)
pub struct LocalFileDocument {
    meta: DocumentMeta,
    source: PathBuf,
}

impl LocalFileDocument {
    /// Describe a local file; the declared size is read from its metadata
    pub async fn open(source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let metadata = tokio::fs::metadata(&source).await.map_err(|e| {
            PageBriefError::not_found(format!("{}: {}", source.display(), e))
        })?;
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let unique_id = uuid::Uuid::new_v4().simple().to_string();

        Ok(Self {
            meta: DocumentMeta::new(file_name, metadata.len(), unique_id),
            source,
        })
    }
}

#[async_trait]
impl DocumentHandle for LocalFileDocument {
    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    async fn download_to(&self, dest: &Path) -> Result<()> {
        tokio::fs::copy(&self.source, dest).await?;
        Ok(())
    }
}
