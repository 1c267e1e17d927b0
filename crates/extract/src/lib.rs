//! PageBrief text extraction
//!
//! Turns a document on disk into ordered per-page text records

mod extractor;
pub mod pdf;
pub mod types;

// Re-export main types
pub use extractor::TextExtractor;
pub use pdf::PdfExtractor;
pub use types::{total_chars, PageText};
