//! Markdown rendering.
//!
//! The pipeline is pure: Markdown in, sanitised HTML plus a table of contents
//! out. Callers own any state changes around it.

mod service;
mod toc;
mod types;

pub use service::{MarkdownRenderer, plain_text_summary, render_service};
pub use toc::{build_toc_block, extract_toc_list};
pub use types::{RenderError, RenderOutput, RenderService, TocEntry};
