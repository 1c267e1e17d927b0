use pagebrief_extract::PageText;

/// Separator placed between page texts when they are concatenated
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Break strategies, most preferred first: paragraph, line, word
const BREAK_SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Text chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of the chunk in the sequence
    pub index: usize,

    /// Chunk text
    pub text: String,

    /// Start char index in the source text
    pub start: usize,

    /// End char index (exclusive) in the source text
    pub end: usize,
}

impl TextChunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Split page texts into overlapping chunks of at most `max_len` characters
///
/// Pages without text are skipped; the remaining ones are joined with a
/// paragraph break. Returns an empty vector when nothing is left.
pub fn segment(pages: &[PageText], max_len: usize, overlap: usize) -> Vec<TextChunk> {
    let joined = pages
        .iter()
        .filter(|p| p.has_text())
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR);

    segment_text(&joined, max_len, overlap)
}

/// Split text into overlapping chunks of at most `max_len` characters
///
/// Chunk `i + 1` starts with the last `overlap` characters of chunk `i`.
/// Lengths are counted in chars, never splitting a code point.
pub fn segment_text(text: &str, max_len: usize, overlap: usize) -> Vec<TextChunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let max_len = max_len.max(1);
    // Each chunk must advance past the overlap it inherits
    let overlap = overlap.min(max_len - 1);

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        if total - start <= max_len {
            chunks.push(make_chunk(&chars, chunks.len(), start, total));
            break;
        }

        let end = find_break_point(&chars, start, start + max_len, overlap);
        chunks.push(make_chunk(&chars, chunks.len(), start, end));
        start = end - overlap;
    }

    chunks
}

fn make_chunk(chars: &[char], index: usize, start: usize, end: usize) -> TextChunk {
    TextChunk {
        index,
        text: chars[start..end].iter().collect(),
        start,
        end,
    }
}

/// Find where the chunk starting at `start` should end
///
/// Only the last 20% of the window is searched so chunks stay close to the
/// size limit. The result is always greater than `start + overlap`.
fn find_break_point(chars: &[char], start: usize, window_end: usize, overlap: usize) -> usize {
    let window = window_end - start;
    let search_start = start + (window * 80 / 100).max(overlap + 1);

    for separator in BREAK_SEPARATORS {
        let sep: Vec<char> = separator.chars().collect();
        if window_end < search_start + sep.len() {
            continue;
        }

        let found = (search_start..=window_end - sep.len())
            .rev()
            .find(|&i| chars[i..i + sep.len()] == sep[..]);

        if let Some(pos) = found {
            // Keep the separator at the end of the chunk
            return pos + sep.len();
        }
    }

    window_end
}
