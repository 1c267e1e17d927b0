use async_trait::async_trait;
use pagebrief_common::{PageBriefError, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::chunking::{segment_text, TextChunk};
use crate::llm_trait::LlmClient;
use crate::prompts::PromptTemplate;
use crate::store::ResolvedPrompt;
use crate::types::{SamplingOptions, Summary};

/// Separator between partial summaries in the reduce input
pub const PARTIAL_SEPARATOR: &str = "\n\n";

/// Map-reduce settings
#[derive(Debug, Clone, Copy)]
pub struct SummarizerOptions {
    /// Chunk size bound, also the largest reduce input
    pub max_chunk_len: usize,

    /// Overlap used when partial summaries are re-chunked
    pub chunk_overlap: usize,

    /// Re-chunking levels allowed before giving up
    pub max_reduce_depth: usize,

    /// Sampling settings for every completion call
    pub sampling: SamplingOptions,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            max_chunk_len: 4000,
            chunk_overlap: 200,
            max_reduce_depth: 4,
            sampling: SamplingOptions::default(),
        }
    }
}

/// A unit of work inside one summarization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStep {
    /// Summarizing chunk `index` (1-based) of `total` at a reduce level
    Map { level: usize, index: usize, total: usize },
    /// Final combining call
    Reduce { level: usize },
}

/// Receives step notifications while a summary is produced
#[async_trait]
pub trait SummaryObserver: Send + Sync {
    async fn on_step(&self, step: SummaryStep);
}

/// Summarizer for long text using map-reduce strategy
pub struct Summarizer {
    client: Arc<dyn LlmClient>,
    options: SummarizerOptions,
}

impl Summarizer {
    /// Create new summarizer
    pub fn new(client: Arc<dyn LlmClient>, options: SummarizerOptions) -> Self {
        Self { client, options }
    }

    /// Backend description, for logs
    pub fn backend(&self) -> String {
        self.client.describe()
    }

    pub fn options(&self) -> &SummarizerOptions {
        &self.options
    }

    /// Summarize chunks with map-reduce
    ///
    /// Every chunk is mapped through the template, even when there is only
    /// one. Partial summaries are joined and reduced with the same template;
    /// if the joined text exceeds `max_chunk_len` it is re-chunked and mapped
    /// again, up to `max_reduce_depth` levels.
    pub async fn summarize(
        &self,
        chunks: &[TextChunk],
        prompt: &ResolvedPrompt,
        observer: Option<&dyn SummaryObserver>,
    ) -> Result<Summary> {
        if chunks.is_empty() {
            return Err(PageBriefError::invalid_input("No chunks to summarize"));
        }

        info!(
            "Starting summarization - Chunks: {}, Prompt: {}, Backend: {}",
            chunks.len(),
            prompt.kind,
            self.client.describe()
        );

        let mut calls = 0;
        let mut level = 0;
        let mut partials = self
            .map_phase(chunks, &prompt.template, level, observer, &mut calls)
            .await?;

        let combined = loop {
            let combined = partials.join(PARTIAL_SEPARATOR);
            let combined_len = combined.chars().count();
            if combined_len <= self.options.max_chunk_len {
                break combined;
            }

            if level >= self.options.max_reduce_depth {
                return Err(PageBriefError::summarization(PageBriefError::llm(format!(
                    "Partial summaries still {} chars after {} reduce levels",
                    combined_len, level
                ))));
            }

            level += 1;
            let regrouped =
                segment_text(&combined, self.options.max_chunk_len, self.options.chunk_overlap);
            info!(
                "Partial summaries too long ({} chars), re-chunked into {} at level {}",
                combined_len,
                regrouped.len(),
                level
            );
            partials = self
                .map_phase(&regrouped, &prompt.template, level, observer, &mut calls)
                .await?;
        };

        if let Some(observer) = observer {
            observer.on_step(SummaryStep::Reduce { level }).await;
        }
        debug!("Reducing {} partial summaries ({} chars)", partials.len(), combined.len());
        let text = self.complete(prompt.template.render(&combined), &mut calls).await?;

        info!("Summarization completed - Calls: {}, Reduce levels: {}", calls, level);

        Ok(Summary {
            text,
            chunk_count: chunks.len(),
            prompt_kind: prompt.kind,
            reduce_levels: level,
            completion_calls: calls,
        })
    }

    /// Summarize each chunk independently, in order
    async fn map_phase(
        &self,
        chunks: &[TextChunk],
        template: &PromptTemplate,
        level: usize,
        observer: Option<&dyn SummaryObserver>,
        calls: &mut usize,
    ) -> Result<Vec<String>> {
        let mut partials = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            if let Some(observer) = observer {
                observer
                    .on_step(SummaryStep::Map {
                        level,
                        index: i + 1,
                        total: chunks.len(),
                    })
                    .await;
            }
            debug!("Summarizing chunk {}/{} (level {})", i + 1, chunks.len(), level);
            partials.push(self.complete(template.render(&chunk.text), calls).await?);
        }
        Ok(partials)
    }

    /// One completion call; failures are not retried here
    async fn complete(&self, prompt: String, calls: &mut usize) -> Result<String> {
        *calls += 1;
        let output = self
            .client
            .complete(&prompt, &self.options.sampling)
            .await
            .map_err(PageBriefError::summarization)?;
        Ok(output.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptKind;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(usize, &str) -> Result<String> + Send + Sync>;

    /// Answers through a closure and records every prompt
    struct StubClient {
        responder: Responder,
        prompts: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn new(responder: impl Fn(usize, &str) -> Result<String> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                responder: Box::new(responder),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmClient for StubClient {
        async fn complete(&self, prompt: &str, _sampling: &SamplingOptions) -> Result<String> {
            let call = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            (self.responder)(call, prompt)
        }

        async fn test_connection(&self) -> Result<bool> {
            Ok(true)
        }

        fn describe(&self) -> String {
            "stub".to_string()
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        steps: Mutex<Vec<SummaryStep>>,
    }

    #[async_trait]
    impl SummaryObserver for RecordingObserver {
        async fn on_step(&self, step: SummaryStep) {
            self.steps.lock().unwrap().push(step);
        }
    }

    fn plain_prompt() -> ResolvedPrompt {
        ResolvedPrompt {
            template: PromptTemplate::from_user_text("{text}"),
            kind: PromptKind::Custom,
        }
    }

    fn options(max_chunk_len: usize, max_reduce_depth: usize) -> SummarizerOptions {
        SummarizerOptions {
            max_chunk_len,
            chunk_overlap: 10,
            max_reduce_depth,
            sampling: SamplingOptions::with_temperature(0.1),
        }
    }

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk {
                index: i,
                text: t.to_string(),
                start: 0,
                end: t.chars().count(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_three_chunks_take_four_calls() {
        let client = StubClient::new(|call, _| Ok(format!("  partial {}  ", call)));
        let summarizer = Summarizer::new(client.clone(), options(4000, 4));

        let summary = summarizer
            .summarize(&chunks(&["one", "two", "three"]), &plain_prompt(), None)
            .await
            .unwrap();

        assert_eq!(client.calls(), 4);
        assert_eq!(summary.completion_calls, 4);
        assert_eq!(summary.chunk_count, 3);
        assert_eq!(summary.reduce_levels, 0);
        assert_eq!(summary.text, "partial 4");

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts[3], "partial 1\n\npartial 2\n\npartial 3");
    }

    #[tokio::test]
    async fn test_single_chunk_still_reduces() {
        let client = StubClient::new(|_, prompt| Ok(format!("S:{}", prompt)));
        let summarizer = Summarizer::new(client.clone(), options(4000, 4));

        let summary = summarizer
            .summarize(&chunks(&["body"]), &plain_prompt(), None)
            .await
            .unwrap();

        assert_eq!(client.calls(), 2);
        assert_eq!(summary.text, "S:S:body");
    }

    #[tokio::test]
    async fn test_template_substitution() {
        let client = StubClient::new(|_, _| Ok("ok".to_string()));
        let summarizer = Summarizer::new(client.clone(), options(4000, 4));
        let prompt = ResolvedPrompt {
            template: PromptTemplate::from_user_text("Bullets only"),
            kind: PromptKind::Custom,
        };

        summarizer.summarize(&chunks(&["chunk body"]), &prompt, None).await.unwrap();

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts[0], "Bullets only\n\nText: chunk body");
        assert_eq!(prompts[1], "Bullets only\n\nText: ok");
    }

    #[tokio::test]
    async fn test_oversized_partials_reduce_recursively() {
        let client = StubClient::new(|call, _| {
            if call <= 4 {
                Ok("x".repeat(60))
            } else {
                Ok("short".to_string())
            }
        });
        let summarizer = Summarizer::new(client.clone(), options(100, 4));

        let summary = summarizer
            .summarize(&chunks(&["a", "b", "c", "d"]), &plain_prompt(), None)
            .await
            .unwrap();

        // 4 map calls, 3 regrouped map calls, 1 reduce
        assert_eq!(summary.reduce_levels, 1);
        assert_eq!(client.calls(), 8);
        assert_eq!(summary.text, "short");

        let regrouped = segment_text(&vec!["x".repeat(60); 4].join(PARTIAL_SEPARATOR), 100, 10);
        assert_eq!(regrouped.len(), 3);
    }

    #[tokio::test]
    async fn test_reduce_depth_exhausted() {
        let client = StubClient::new(|_, _| Ok("x".repeat(60)));
        let summarizer = Summarizer::new(client, options(100, 1));

        let err = summarizer
            .summarize(&chunks(&["a", "b", "c", "d"]), &plain_prompt(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, PageBriefError::Summarization(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_failure_propagates_without_retry() {
        let client = StubClient::new(|call, _| {
            if call == 2 {
                Err(PageBriefError::network("quota exceeded"))
            } else {
                Ok("fine".to_string())
            }
        });
        let summarizer = Summarizer::new(client.clone(), options(4000, 4));

        let err = summarizer
            .summarize(&chunks(&["a", "b", "c"]), &plain_prompt(), None)
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 2);
        match err {
            PageBriefError::Summarization(cause) => {
                assert!(matches!(*cause, PageBriefError::Network(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_chunks_rejected() {
        let client = StubClient::new(|_, _| Ok("unused".to_string()));
        let summarizer = Summarizer::new(client.clone(), options(4000, 4));

        assert!(summarizer.summarize(&[], &plain_prompt(), None).await.is_err());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_observer_sees_steps_in_order() {
        let client = StubClient::new(|_, _| Ok("p".to_string()));
        let summarizer = Summarizer::new(client, options(4000, 4));
        let observer = RecordingObserver::default();

        summarizer
            .summarize(&chunks(&["a", "b"]), &plain_prompt(), Some(&observer))
            .await
            .unwrap();

        let steps = observer.steps.lock().unwrap();
        assert_eq!(
            *steps,
            vec![
                SummaryStep::Map { level: 0, index: 1, total: 2 },
                SummaryStep::Map { level: 0, index: 2, total: 2 },
                SummaryStep::Reduce { level: 0 },
            ]
        );
    }
}
