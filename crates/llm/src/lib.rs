//! PageBrief LLM Integration
//!
//! Chunking, prompt templates, completion clients and map-reduce summarization

mod chunking;
mod client;
mod gemini;
mod llm_trait;
mod prompts;
mod store;
mod summarize;
mod types;

pub use chunking::{segment, segment_text, TextChunk, PAGE_SEPARATOR};
pub use client::OllamaClient;
pub use gemini::GeminiClient;
pub use llm_trait::LlmClient;
pub use prompts::{PromptKind, PromptTemplate, DEFAULT_PROMPT, PLACEHOLDER};
pub use store::{PromptResolver, ResolvedPrompt, UserId, UserPromptStore};
pub use summarize::{Summarizer, SummarizerOptions, SummaryObserver, SummaryStep, PARTIAL_SEPARATOR};
pub use types::{GenerateOptions, GenerateRequest, GenerateResponse, SamplingOptions, Summary};
