//! User-facing message texts

use pagebrief_llm::{PromptKind, PromptTemplate};

/// Appended verbatim to a cut summary message
pub const TRUNCATION_NOTICE: &str = "\n\n... (Summary truncated due to length limits)";

/// Characters of a saved prompt echoed back in the confirmation
pub const SAVED_PROMPT_PREVIEW_CHARS: usize = 150;

/// Characters of the effective prompt shown by "view prompt"
pub const SHOWN_PROMPT_PREVIEW_CHARS: usize = 400;

pub const PROCESSING_STARTED: &str = "🚀 Processing Started\n\nAnalyzing your PDF...";

pub const PROCESSING_FAILED: &str = "❌ Processing Failed\n\n\
Sorry, I couldn't process your PDF. Please try with a different file.\n\n\
Make sure it's a valid PDF with readable text.";

pub const WRONG_FILE_TYPE: &str = "❌ Wrong File Type\n\nPlease send PDF files only.";

/// Greeting for `/start`
pub fn welcome(max_file_size: u64) -> String {
    format!(
        "🤖 PDF Summarizer\n\n\
         What I do:\n\
         I read your PDF files and create smart summaries using AI!\n\n\
         How to use me:\n\
         1️⃣ Just send me any PDF file (up to {})\n\
         2️⃣ Wait a moment while I analyze it\n\
         3️⃣ Get your summary instantly!\n\n\
         Need options? Use the buttons below:",
        human_size(max_file_size)
    )
}

pub fn help(max_file_size: u64) -> String {
    format!(
        "📚 Help & Instructions\n\n\
         File Requirements:\n\
         • PDF files only\n\
         • Maximum size: {}\n\n\
         Available Commands:\n\
         • /start - Show main menu\n\
         • /cancel - Cancel prompt setup\n\n\
         How It Works:\n\
         1. Send your PDF file\n\
         2. The document is processed\n\
         3. Receive an AI-generated summary\n\n\
         Button Functions:\n\
         • Custom Prompt - Set personalized instructions\n\
         • View Prompt - See current prompt\n\
         • Reset Prompt - Back to default\n\
         • Help - Show this information",
        human_size(max_file_size)
    )
}

/// Reply to text sent outside any conversation
pub fn send_pdf(max_file_size: u64) -> String {
    format!(
        "📄 Send me a PDF file!\n\n\
         I can only work with PDF documents.\n\
         Just send me any PDF file to get started!\n\n\
         File requirements:\n\
         • PDF format only\n\
         • Maximum {} size",
        human_size(max_file_size)
    )
}

pub const PROMPT_SETUP: &str = "✏️ Custom Prompt Setup\n\n\
Send me your custom instructions for summarizing PDFs.\n\n\
Examples:\n\
• \"Focus on key financial data and recommendations\"\n\
• \"Summarize in bullet points with main conclusions\"\n\
• \"Extract technical details and implementation steps\"\n\n\
Just type your instructions and send.\n\
Or type /cancel to go back.";

pub const PROMPT_CANCELLED: &str = "❌ Cancelled\n\nYour prompt settings remain unchanged.";

pub const PROMPT_RESET: &str = "✅ Prompt Reset\n\nNow using the default summarization prompt.";

pub const PROMPT_ALREADY_DEFAULT: &str = "ℹ️ Already Default\n\nYou're already using the default prompt.";

/// Rejection for a document over the size ceiling
pub fn file_too_large(max_bytes: u64) -> String {
    format!(
        "❌ File Too Large\n\nPlease send files smaller than {}.",
        human_size(max_bytes)
    )
}

/// Confirmation after a custom prompt was stored
pub fn prompt_saved(template: &PromptTemplate) -> String {
    format!(
        "✅ Custom Prompt Saved!\n\n\
         Your prompt:\n{}\n\n\
         This will be used for all your PDF summaries.\n\n\
         Ready to test? Send me a PDF file!",
        template.preview(SAVED_PROMPT_PREVIEW_CHARS)
    )
}

/// The effective prompt of a user
pub fn prompt_overview(template: &PromptTemplate, kind: PromptKind) -> String {
    format!(
        "📋 {} Prompt\n\n{}\n\nThis is your current summarization prompt.",
        kind.title(),
        template.preview(SHOWN_PROMPT_PREVIEW_CHARS)
    )
}

/// Final result message, before truncation
pub fn summary_message(
    file_name: &str,
    page_count: usize,
    chunk_count: usize,
    kind: PromptKind,
    summary: &str,
) -> String {
    format!(
        "✅ Summary Complete!\n\n\
         File: {}\n\
         Pages: {} - Chunks: {}\n\
         Prompt: {}\n\n\
         Summary:\n{}",
        file_name,
        page_count,
        chunk_count,
        kind.title(),
        summary
    )
}

/// Cut `message` to at most `max_chars` characters
///
/// A cut message keeps its head and ends with [`TRUNCATION_NOTICE`].
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }

    let keep = max_chars.saturating_sub(TRUNCATION_NOTICE.chars().count());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_NOTICE);
    truncated
}

/// "20MB"-style size for user texts
fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;

    let (unit, suffix) = match bytes {
        b if b >= MIB => (MIB, "MB"),
        b if b >= KIB => (KIB, "KB"),
        _ => return format!("{} bytes", bytes),
    };

    if bytes % unit == 0 {
        format!("{}{}", bytes / unit, suffix)
    } else {
        format!("{:.1}{}", bytes as f64 / unit as f64, suffix)
    }
}
