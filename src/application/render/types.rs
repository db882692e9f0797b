use thiserror::Error;

/// One heading discovered while rendering, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub anchor: String,
    pub title: String,
}

/// Deterministic rendering result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// Sanitised body HTML with `id` attributes on every Markdown heading.
    pub html: String,
    /// Full table-of-contents block, `<div class="toc"><ul>…</ul></div>`.
    pub toc_block: String,
    pub headings: Vec<TocEntry>,
    pub contains_code: bool,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown formatting failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
}

/// Markdown to HTML conversion. Implementations must be pure: the same input
/// yields the same output or error.
pub trait RenderService: Send + Sync {
    fn render(&self, markdown: &str) -> Result<RenderOutput, RenderError>;
}
