use async_trait::async_trait;
use pagebrief_common::{AppConfig, PageBriefError, Result};
use pagebrief_extract::{total_chars, TextExtractor};
use pagebrief_llm::{segment, PromptKind, PromptResolver, Summarizer, SummaryObserver, SummaryStep, UserId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::document::DocumentHandle;
use crate::format;
use crate::progress::{MessageProgressSink, ProgressReporter, ProgressStage};
use crate::transport::{Button, ChatId, ChatTransport, MessageId, MAIN_MENU};

/// Pipeline limits
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Working directory for temporary document files
    pub download_dir: PathBuf,

    /// Largest accepted declared size, in bytes
    pub max_file_size: u64,

    /// Character budget of the delivered message
    pub max_message_len: usize,
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            download_dir: config.download_dir.clone(),
            max_file_size: config.max_file_size,
            max_message_len: config.max_message_len,
        }
    }
}

/// States of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Received,
    Validated,
    Downloaded,
    Extracted,
    Segmented,
    Summarized,
    Formatted,
    Delivered,
    /// Refused at validation, nothing was downloaded
    Rejected,
    Failed,
}

/// Why a document was refused at the entry guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    WrongType,
    TooLarge,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::WrongType => "unsupported file type",
            Self::TooLarge => "declared size over the ceiling",
        }
    }
}

impl From<Rejection> for PageBriefError {
    fn from(rejection: Rejection) -> Self {
        PageBriefError::validation(rejection.reason())
    }
}

/// Facts about a successful run
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub file_name: String,
    pub page_count: usize,
    pub chunk_count: usize,
    pub prompt_kind: PromptKind,
    pub reduce_levels: usize,
    pub completion_calls: usize,
}

/// Result of [`Pipeline::run`]
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Final state reached
    pub state: PipelineState,

    /// Message that carries the final text, if it reached the chat
    pub message_id: Option<MessageId>,

    /// Text shown to the user
    pub text: String,

    pub report: Option<SummaryReport>,
}

/// Document-to-summary orchestrator
///
/// One `run` per inbound document. Every failure after validation ends in
/// [`PipelineState::Failed`] with a generic message; the detail goes to the log.
pub struct Pipeline {
    options: PipelineOptions,
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<Summarizer>,
    prompts: PromptResolver,
    transport: Arc<dyn ChatTransport>,
}

impl Pipeline {
    pub fn new(
        options: PipelineOptions,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<Summarizer>,
        prompts: PromptResolver,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            options,
            extractor,
            summarizer,
            prompts,
            transport,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Summarize one document for `user_id`, reporting into `chat_id`
    pub async fn run(
        &self,
        document: &dyn DocumentHandle,
        user_id: UserId,
        chat_id: ChatId,
    ) -> PipelineOutcome {
        let meta = document.meta();
        info!(
            "Document received from user {}: {} ({} bytes)",
            user_id, meta.file_name, meta.declared_size
        );

        if let Err(rejection) = self.validate(document) {
            warn!(
                "Rejected {} from user {}: {}",
                meta.file_name,
                user_id,
                PageBriefError::from(rejection)
            );
            let text = match rejection {
                Rejection::WrongType => format::WRONG_FILE_TYPE.to_string(),
                Rejection::TooLarge => format::file_too_large(self.options.max_file_size),
            };
            let message_id = self.send(chat_id, &text, &[]).await;
            return PipelineOutcome {
                state: PipelineState::Rejected,
                message_id,
                text,
                report: None,
            };
        }

        let message_id = self.send(chat_id, format::PROCESSING_STARTED, &[]).await;
        let reporter = match message_id {
            Some(id) => ProgressReporter::new(Arc::new(MessageProgressSink::new(
                self.transport.clone(),
                id,
            ))),
            None => ProgressReporter::detached(),
        };

        let temp_path = self.temp_path(document, user_id);
        let mut state = PipelineState::Validated;
        let result = self
            .process(document, user_id, &temp_path, &reporter, &mut state)
            .await;
        self.cleanup(&temp_path).await;

        match result {
            Ok((text, report)) => {
                let delivered = self.deliver(chat_id, message_id, &text).await;
                let state = if delivered.is_some() {
                    info!("Summary delivered to user {}", user_id);
                    PipelineState::Delivered
                } else {
                    error!("Could not deliver summary to user {}", user_id);
                    PipelineState::Formatted
                };
                PipelineOutcome {
                    state,
                    message_id: delivered,
                    text,
                    report: Some(report),
                }
            }
            Err(e) => {
                error!(
                    "Processing failed for user {} after {:?}: {}",
                    user_id, state, e
                );
                let text = format::PROCESSING_FAILED.to_string();
                let delivered = self.deliver(chat_id, message_id, &text).await;
                PipelineOutcome {
                    state: PipelineState::Failed,
                    message_id: delivered,
                    text,
                    report: None,
                }
            }
        }
    }

    /// Entry guard: expected extension and declared size
    fn validate(&self, document: &dyn DocumentHandle) -> std::result::Result<(), Rejection> {
        let meta = document.meta();
        let extension = format!(".{}", self.extractor.extension());
        if !meta.file_name.to_lowercase().ends_with(&extension) {
            return Err(Rejection::WrongType);
        }

        if meta.declared_size > self.options.max_file_size {
            return Err(Rejection::TooLarge);
        }

        Ok(())
    }

    async fn process(
        &self,
        document: &dyn DocumentHandle,
        user_id: UserId,
        temp_path: &Path,
        reporter: &ProgressReporter,
        state: &mut PipelineState,
    ) -> Result<(String, SummaryReport)> {
        let meta = document.meta();

        reporter
            .report(ProgressStage::Downloading, format!("Getting {}", meta.file_name))
            .await;
        document
            .download_to(temp_path)
            .await
            .map_err(|e| PageBriefError::download(format!("{}: {}", meta.file_name, e)))?;
        info!("Document downloaded: {}", temp_path.display());
        *state = PipelineState::Downloaded;

        reporter
            .report(ProgressStage::Reading, "Extracting text content...")
            .await;
        let pages = self.extractor.extract(temp_path).await?;
        if pages.is_empty() {
            return Err(PageBriefError::extraction("Document has no pages"));
        }
        let page_count = pages.len();
        info!("Loaded {} pages ({} chars)", page_count, total_chars(&pages));
        *state = PipelineState::Extracted;

        reporter
            .report(
                ProgressStage::Processing,
                format!("Analyzing {} pages...", page_count),
            )
            .await;
        let options = self.summarizer.options();
        let chunks = segment(&pages, options.max_chunk_len, options.chunk_overlap);
        if chunks.is_empty() {
            return Err(PageBriefError::extraction("No extractable text"));
        }
        debug!("Split into {} chunks", chunks.len());
        *state = PipelineState::Segmented;

        let prompt = self.prompts.resolve(user_id).await;
        info!("Using {} prompt for user {}", prompt.kind, user_id);
        reporter
            .report(
                ProgressStage::AiAnalysis,
                format!("Creating summary with {} prompt...", prompt.kind),
            )
            .await;
        let observer = StepProgress { reporter };
        let summary = self
            .summarizer
            .summarize(&chunks, &prompt, Some(&observer))
            .await?;
        *state = PipelineState::Summarized;

        reporter
            .report(ProgressStage::Finalizing, "Preparing your summary...")
            .await;
        let message = format::summary_message(
            &meta.file_name,
            page_count,
            summary.chunk_count,
            summary.prompt_kind,
            &summary.text,
        );
        let text = format::truncate_message(&message, self.options.max_message_len);
        *state = PipelineState::Formatted;

        let report = SummaryReport {
            file_name: meta.file_name.clone(),
            page_count,
            chunk_count: summary.chunk_count,
            prompt_kind: summary.prompt_kind,
            reduce_levels: summary.reduce_levels,
            completion_calls: summary.completion_calls,
        };
        Ok((text, report))
    }

    /// `{user_id}_{unique_id}.{ext}` inside the download directory
    fn temp_path(&self, document: &dyn DocumentHandle, user_id: UserId) -> PathBuf {
        let unique_id: String = document
            .meta()
            .unique_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.options.download_dir.join(format!(
            "{}_{}.{}",
            user_id,
            unique_id,
            self.extractor.extension()
        ))
    }

    async fn cleanup(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => info!("Cleaned up: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Cleanup failed for {}: {}", path.display(), e),
        }
    }

    /// Replace the progress message with `text`, or send it fresh
    async fn deliver(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        text: &str,
    ) -> Option<MessageId> {
        if let Some(id) = message_id {
            match self.transport.edit_message(id, text, MAIN_MENU).await {
                Ok(()) => return Some(id),
                Err(e) => warn!("Failed to edit message {}, sending a new one: {}", id, e),
            }
        }
        self.send(chat_id, text, MAIN_MENU).await
    }

    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> Option<MessageId> {
        match self.transport.send_message(chat_id, text, buttons).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to send message to chat {}: {}", chat_id, e);
                None
            }
        }
    }
}

/// Forwards summarizer steps as AI Analysis details
struct StepProgress<'a> {
    reporter: &'a ProgressReporter,
}

#[async_trait]
impl<'a> SummaryObserver for StepProgress<'a> {
    async fn on_step(&self, step: SummaryStep) {
        let detail = match step {
            SummaryStep::Map {
                level: 0,
                index,
                total,
            } => format!("Summarizing section {} of {}...", index, total),
            SummaryStep::Map {
                level,
                index,
                total,
            } => format!(
                "Condensing partial summaries {} of {} (pass {})...",
                index, total, level
            ),
            SummaryStep::Reduce { .. } => "Combining partial summaries...".to_string(),
        };
        self.reporter.update_detail(detail).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentMeta, InMemoryDocument};
    use pagebrief_extract::PageText;
    use pagebrief_llm::{LlmClient, SamplingOptions, SummarizerOptions, UserPromptStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const USER: UserId = 7;
    const CHAT: ChatId = 70;

    /// Returns fixed pages and checks the temp file exists
    struct StubExtractor {
        pages: Vec<PageText>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract(&self, path: &Path) -> Result<Vec<PageText>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(path.exists(), "document should be downloaded before extraction");
            Ok(self.pages.clone())
        }

        fn extension(&self) -> &'static str {
            "pdf"
        }
    }

    enum Reply {
        Echo,
        Fixed(String),
        Fail,
    }

    struct StubLlm {
        reply: Reply,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn complete(&self, prompt: &str, _sampling: &SamplingOptions) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Echo => Ok(format!("S:{}", prompt)),
                Reply::Fixed(text) => Ok(text.clone()),
                Reply::Fail => Err(PageBriefError::network("connection refused by backend-7")),
            }
        }

        async fn test_connection(&self) -> Result<bool> {
            Ok(true)
        }

        fn describe(&self) -> String {
            "stub".to_string()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Sent(MessageId, String),
        Edited(MessageId, String),
    }

    #[derive(Default)]
    struct RecordingTransport {
        events: Mutex<Vec<Event>>,
        next_id: AtomicUsize,
        fail_edits: bool,
    }

    impl RecordingTransport {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_message(&self, _chat_id: ChatId, text: &str, _buttons: &[Button]) -> Result<MessageId> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as MessageId + 1;
            self.events.lock().unwrap().push(Event::Sent(id, text.to_string()));
            Ok(id)
        }

        async fn edit_message(&self, message_id: MessageId, text: &str, _buttons: &[Button]) -> Result<()> {
            if self.fail_edits {
                return Err(PageBriefError::transport("message to edit not found"));
            }
            self.events
                .lock()
                .unwrap()
                .push(Event::Edited(message_id, text.to_string()));
            Ok(())
        }

        async fn delete_message(&self, _message_id: MessageId) -> Result<()> {
            Ok(())
        }
    }

    struct Harness {
        pipeline: Pipeline,
        extractor: Arc<StubExtractor>,
        llm: Arc<StubLlm>,
        transport: Arc<RecordingTransport>,
        prompts: PromptResolver,
        dir: tempfile::TempDir,
    }

    fn harness(pages: Vec<PageText>, reply: Reply, transport: RecordingTransport) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(StubExtractor {
            pages,
            calls: AtomicUsize::new(0),
        });
        let llm = Arc::new(StubLlm {
            reply,
            calls: AtomicUsize::new(0),
        });
        let transport = Arc::new(transport);
        let prompts = PromptResolver::new(Arc::new(UserPromptStore::new(16)));
        let options = PipelineOptions {
            download_dir: dir.path().to_path_buf(),
            max_file_size: 20 * 1024 * 1024,
            max_message_len: 4000,
        };
        let summarizer = Arc::new(Summarizer::new(llm.clone(), SummarizerOptions::default()));
        let pipeline = Pipeline::new(
            options,
            extractor.clone(),
            summarizer,
            prompts.clone(),
            transport.clone(),
        );

        Harness {
            pipeline,
            extractor,
            llm,
            transport,
            prompts,
            dir,
        }
    }

    fn document(name: &str, declared_size: u64) -> InMemoryDocument {
        InMemoryDocument::new(DocumentMeta::new(name, declared_size, "AgAD/x1"), b"%PDF-1.5".to_vec())
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_oversized_document_rejected_without_temp_file() {
        let h = harness(vec![PageText::new(0, "text")], Reply::Echo, RecordingTransport::default());
        let doc = document("big.pdf", 21 * 1024 * 1024);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Rejected);
        assert!(outcome.text.contains("File Too Large"));
        assert!(dir_is_empty(h.dir.path()));
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.transport.events().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_extension_rejected() {
        let h = harness(vec![PageText::new(0, "text")], Reply::Echo, RecordingTransport::default());
        let doc = document("notes.txt", 10);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Rejected);
        assert_eq!(outcome.text, format::WRONG_FILE_TYPE);
    }

    #[tokio::test]
    async fn test_extension_check_is_case_insensitive() {
        let h = harness(vec![PageText::new(0, "text")], Reply::Echo, RecordingTransport::default());
        let doc = document("REPORT.PDF", 10);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Delivered);
    }

    #[tokio::test]
    async fn test_zero_pages_fails_without_summarizing() {
        let h = harness(Vec::new(), Reply::Echo, RecordingTransport::default());
        let doc = document("empty.pdf", 10);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Failed);
        assert_eq!(outcome.text, format::PROCESSING_FAILED);
        assert_eq!(h.llm.calls.load(Ordering::SeqCst), 0);
        assert!(dir_is_empty(h.dir.path()));
    }

    #[tokio::test]
    async fn test_blank_pages_fail_as_no_text() {
        let h = harness(
            vec![PageText::new(0, "  "), PageText::new(1, "\n")],
            Reply::Echo,
            RecordingTransport::default(),
        );
        let doc = document("scan.pdf", 10);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Failed);
        assert_eq!(h.llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_two_pages() {
        let page_a = "a".repeat(50);
        let page_b = "b".repeat(50);
        let h = harness(
            vec![PageText::new(0, page_a.clone()), PageText::new(1, page_b.clone())],
            Reply::Echo,
            RecordingTransport::default(),
        );
        h.prompts.set(USER, "{text}").await;
        let doc = document("report.pdf", 1024);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Delivered);
        let report = outcome.report.unwrap();
        assert_eq!(report.page_count, 2);
        assert_eq!(report.chunk_count, 1);
        assert_eq!(report.completion_calls, 2);

        // map echoes the chunk once, reduce echoes the partial again
        let expected = format!("S:S:{}\n\n{}", page_a, page_b);
        assert!(outcome.text.contains("Pages: 2 - Chunks: 1"));
        assert!(outcome.text.contains("Prompt: Custom"));
        assert!(outcome.text.ends_with(&expected));
        assert!(dir_is_empty(h.dir.path()));
    }

    #[tokio::test]
    async fn test_progress_stages_in_order() {
        let h = harness(vec![PageText::new(0, "content")], Reply::Echo, RecordingTransport::default());
        let doc = document("report.pdf", 10);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;
        let events = h.transport.events();

        assert_eq!(events[0], Event::Sent(1, format::PROCESSING_STARTED.to_string()));
        let stage_heads: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                Event::Edited(_, text) if text.ends_with("Please wait...") => {
                    text.lines().next().map(str::to_string)
                }
                _ => None,
            })
            .collect();
        let mut deduped = stage_heads.clone();
        deduped.dedup();
        assert_eq!(
            deduped,
            vec!["📥 Downloading", "📄 Reading PDF", "⚙️ Processing", "🤖 AI Analysis", "📝 Almost Done"]
        );
        assert_eq!(events.last(), Some(&Event::Edited(1, outcome.text.clone())));
    }

    #[tokio::test]
    async fn test_long_summary_truncated() {
        let h = harness(
            vec![PageText::new(0, "content")],
            // fits one reduce input, overflows the message budget
            Reply::Fixed("x".repeat(3990)),
            RecordingTransport::default(),
        );
        let doc = document("report.pdf", 10);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Delivered);
        assert!(outcome.text.chars().count() <= 4000);
        assert!(outcome.text.ends_with(format::TRUNCATION_NOTICE));
    }

    #[tokio::test]
    async fn test_llm_failure_is_generic_and_cleans_up() {
        let h = harness(vec![PageText::new(0, "content")], Reply::Fail, RecordingTransport::default());
        let doc = document("report.pdf", 10);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Failed);
        assert!(!outcome.text.contains("backend-7"));
        assert_eq!(h.llm.calls.load(Ordering::SeqCst), 1);
        assert!(dir_is_empty(h.dir.path()));
    }

    #[tokio::test]
    async fn test_progress_failures_do_not_abort() {
        let transport = RecordingTransport {
            fail_edits: true,
            ..Default::default()
        };
        let h = harness(vec![PageText::new(0, "content")], Reply::Echo, transport);
        let doc = document("report.pdf", 10);

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Delivered);
        // the summary falls back to a fresh message
        assert_eq!(outcome.message_id, Some(2));
        match h.transport.events().last() {
            Some(Event::Sent(2, text)) => assert!(text.starts_with("✅ Summary Complete!")),
            other => panic!("unexpected last event: {:?}", other),
        }
    }

    /// Writes part of the content, then loses the connection
    struct BrokenDocument {
        meta: DocumentMeta,
    }

    #[async_trait]
    impl DocumentHandle for BrokenDocument {
        fn meta(&self) -> &DocumentMeta {
            &self.meta
        }

        async fn download_to(&self, dest: &Path) -> Result<()> {
            tokio::fs::write(dest, b"%PDF-1.").await?;
            Err(PageBriefError::network("connection reset while fetching file-42"))
        }
    }

    #[tokio::test]
    async fn test_download_failure_is_generic_and_cleans_up() {
        let h = harness(vec![PageText::new(0, "content")], Reply::Echo, RecordingTransport::default());
        let doc = BrokenDocument {
            meta: DocumentMeta::new("report.pdf", 10, "AgAD/x1"),
        };

        let outcome = h.pipeline.run(&doc, USER, CHAT).await;

        assert_eq!(outcome.state, PipelineState::Failed);
        assert_eq!(outcome.text, format::PROCESSING_FAILED);
        assert_eq!(outcome.message_id, Some(1));
        assert!(dir_is_empty(h.dir.path()));
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.llm.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.transport.events().last(),
            Some(&Event::Edited(1, format::PROCESSING_FAILED.to_string()))
        );
    }

    #[test]
    fn test_rejection_is_validation_error() {
        let err = PageBriefError::from(Rejection::TooLarge);
        assert!(matches!(err, PageBriefError::Validation(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_temp_path_is_sanitized() {
        let h = harness(Vec::new(), Reply::Echo, RecordingTransport::default());
        let doc = document("a.pdf", 1);

        let path = h.pipeline.temp_path(&doc, USER);

        assert_eq!(path, h.dir.path().join("7_AgAD_x1.pdf"));
    }
}
