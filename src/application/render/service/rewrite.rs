use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use syntect::html::ClassStyle;
use syntect::parsing::SyntaxSet;

use crate::application::render::types::{RenderError, TocEntry};
use crate::domain::slug::AnchorSlugger;

use super::highlight;

#[derive(Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) contains_code: bool,
    pub(crate) headings: Vec<TocEntry>,
}

/// Walk the parsed document once: collect headings with unique anchors and
/// swap fenced code blocks for pre-highlighted HTML.
pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<RewriteOutcome, RenderError> {
    let mut walker = RewriteWalker::new(syntax_set, class_style);
    walker.visit_nodes(root)?;
    Ok(walker.outcome)
}

struct RewriteWalker<'a> {
    syntax_set: &'a SyntaxSet,
    class_style: &'a ClassStyle,
    outcome: RewriteOutcome,
    slugger: AnchorSlugger,
}

impl<'a> RewriteWalker<'a> {
    fn new(syntax_set: &'a SyntaxSet, class_style: &'a ClassStyle) -> Self {
        Self {
            syntax_set,
            class_style,
            outcome: RewriteOutcome::default(),
            slugger: AnchorSlugger::new(),
        }
    }

    fn visit_nodes(&mut self, node: &AstNode<'_>) -> Result<(), RenderError> {
        if let Some(level) = heading_level(node) {
            let text = collect_inline_text(node);
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let anchor = self.slugger.anchor_for(&normalized);
            self.outcome.headings.push(TocEntry {
                level,
                anchor,
                title: normalized,
            });
        }

        if let Some((info, literal)) = extract_code_block(node) {
            let language = info.split_whitespace().next();
            let html =
                highlight::highlight_code(language, &literal, self.syntax_set, self.class_style)?;
            self.outcome.contains_code = true;

            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: html,
            });
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next)?;
            child = next.next_sibling();
        }

        Ok(())
    }
}

fn collect_inline_text(node: &AstNode<'_>) -> String {
    fn walk(node: &AstNode<'_>, buffer: &mut String) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => buffer.push_str(text),
                NodeValue::Code(code) => buffer.push_str(&code.literal),
                NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
                _ => {}
            }
        }
        let mut child = node.first_child();
        while let Some(next) = child {
            walk(next, buffer);
            child = next.next_sibling();
        }
    }

    let mut text = String::new();
    let mut child = node.first_child();
    while let Some(next) = child {
        walk(next, &mut text);
        child = next.next_sibling();
    }
    text
}

fn extract_code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        Some((block.info.trim().to_string(), block.literal.clone()))
    } else {
        None
    }
}

fn heading_level(node: &AstNode<'_>) -> Option<u8> {
    let data = node.data.borrow();
    if let NodeValue::Heading(heading) = &data.value {
        Some(heading.level)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comrak::{Arena, format_html, parse_document};

    fn syntax_and_style() -> (SyntaxSet, ClassStyle) {
        (
            SyntaxSet::load_defaults_newlines(),
            ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        )
    }

    #[test]
    fn headings_are_collected_in_document_order() {
        let options = crate::application::render::service::config::default_options();
        let arena = Arena::new();
        let root = parse_document(&arena, "# Intro\n\n## Setup `cargo`\n\n## Setup cargo\n", &options);
        let (syntax_set, class_style) = syntax_and_style();

        let outcome = rewrite_ast(root, &syntax_set, &class_style).expect("rewrite");
        let summary: Vec<_> = outcome
            .headings
            .iter()
            .map(|entry| (entry.level, entry.anchor.as_str(), entry.title.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (1, "intro", "Intro"),
                (2, "setup-cargo", "Setup cargo"),
                (2, "setup-cargo_1", "Setup cargo"),
            ]
        );
        assert!(!outcome.contains_code);
    }

    #[test]
    fn fenced_code_becomes_highlighted_html() {
        let options = crate::application::render::service::config::default_options();
        let arena = Arena::new();
        let root = parse_document(&arena, "```python\nprint('hi')\n```\n", &options);
        let (syntax_set, class_style) = syntax_and_style();

        let outcome = rewrite_ast(root, &syntax_set, &class_style).expect("rewrite");
        assert!(outcome.contains_code);

        let mut html = String::new();
        format_html(root, &options, &mut html).expect("html");
        assert!(html.contains("<div class=\"codehilite\">"));
        assert!(html.contains("language-python"));
    }
}
