mod config;
mod headings;
mod highlight;
mod rewrite;
mod summary;

use std::sync::Arc;

use comrak::{Arena, format_html_with_plugins, nodes::AstNode, options::Plugins, parse_document};
use once_cell::sync::Lazy;
use syntect::{html::ClassStyle, parsing::SyntaxSet};

use crate::application::render::toc::build_toc_block;
use crate::application::render::types::{RenderError, RenderOutput, RenderService, TocEntry};

use config::{build_sanitizer, default_options};
use headings::AnchoredHeadings;
use rewrite::rewrite_ast;

pub use summary::plain_text_summary;

/// Comrak-based pipeline with Syntect highlighting and Ammonia sanitisation.
pub struct MarkdownRenderer {
    options: comrak::Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
    sanitizer: ammonia::Builder<'static>,
}

impl MarkdownRenderer {
    fn new() -> Self {
        Self {
            options: default_options(),
            syntax_set: SyntaxSet::load_defaults_newlines(),
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
            sanitizer: build_sanitizer(),
        }
    }
}

static RENDER_SERVICE: Lazy<Arc<MarkdownRenderer>> =
    Lazy::new(|| Arc::new(MarkdownRenderer::new()));

/// Shared renderer, initialised on first use. Loading the syntax set is the
/// expensive part, so callers should not build their own.
pub fn render_service() -> Arc<MarkdownRenderer> {
    Arc::clone(&RENDER_SERVICE)
}

impl RenderService for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        let outcome = rewrite_ast(root, &self.syntax_set, &self.class_style)?;
        let rendered = render_html_stage(root, &self.options, &outcome.headings)?;
        let html = self.sanitizer.clean(&rendered).to_string();
        let toc_block = build_toc_block(&outcome.headings);

        Ok(RenderOutput {
            html,
            toc_block,
            headings: outcome.headings,
            contains_code: outcome.contains_code,
        })
    }
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
    headings: &[TocEntry],
) -> Result<String, RenderError> {
    let anchored = AnchoredHeadings::new(headings);
    let mut plugins = Plugins::default();
    plugins.render.heading_adapter = Some(&anchored);

    let mut html = String::new();
    format_html_with_plugins(root, options, &mut html, &plugins).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_receive_anchor_ids_and_toc_entries() {
        let output = render_service()
            .render("# Intro\n\ntext\n\n## Details\n")
            .expect("render");

        assert!(output.html.contains("<h1 id=\"intro\">Intro</h1>"));
        assert!(output.html.contains("<h2 id=\"details\">Details</h2>"));
        assert!(output.toc_block.contains("<a href=\"#details\">Details</a>"));
        assert_eq!(output.headings.len(), 2);
    }

    #[test]
    fn raw_html_headings_do_not_take_markdown_anchors() {
        let output = render_service()
            .render("<h2>Raw</h2>\n\n## Real\n")
            .expect("render");

        assert!(output.html.contains("<h2>Raw</h2>"));
        assert!(output.html.contains("<h2 id=\"real\">Real</h2>"));
        assert!(output.toc_block.contains("<a href=\"#real\">Real</a>"));
        assert_eq!(output.headings.len(), 1);
    }

    #[test]
    fn headings_keep_inline_markup_inside_anchored_tags() {
        let output = render_service()
            .render("## Using `cargo` *well*\n")
            .expect("render");

        assert!(output.html.contains(
            "<h2 id=\"using-cargo-well\">Using <code>cargo</code> <em>well</em></h2>"
        ));
    }

    #[test]
    fn raw_script_is_removed() {
        let output = render_service()
            .render("hello\n\n<script>alert(1)</script>\n")
            .expect("render");

        assert!(!output.html.contains("<script"));
        assert!(output.html.contains("<p>hello</p>"));
    }

    #[test]
    fn code_blocks_survive_sanitising() {
        let output = render_service()
            .render("```rust\nlet x = 1;\n```\n")
            .expect("render");

        assert!(output.contains_code);
        assert!(output.html.contains("class=\"codehilite\""));
        assert!(output.html.contains("syntax-"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let markdown = "# A\n\n## B\n\n```\nplain\n```\n";
        let first = render_service().render(markdown).expect("render");
        let second = render_service().render(markdown).expect("render");

        assert_eq!(first, second);
    }
}
