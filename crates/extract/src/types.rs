use serde::{Deserialize, Serialize};

/// Raw text of a single document page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Zero-based page index
    pub index: usize,

    /// Extracted text, possibly empty for image-only pages
    pub text: String,
}

impl PageText {
    /// Create a new page record
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Whether the page carries any non-whitespace text
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Total number of characters across all pages
pub fn total_chars(pages: &[PageText]) -> usize {
    pages.iter().map(|p| p.text.chars().count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_text() {
        assert!(PageText::new(0, "Intro").has_text());
        assert!(!PageText::new(1, " \n\t").has_text());
    }

    #[test]
    fn test_total_chars_counts_characters() {
        let pages = vec![PageText::new(0, "héllo"), PageText::new(1, "abc")];
        assert_eq!(total_chars(&pages), 8);
    }
}
