use comrak::{
    Arena,
    nodes::{AstNode, NodeValue},
    parse_document,
};

use super::config::default_options;

/// First `max_chars` characters of the document's visible text, with markup
/// and code fences dropped and whitespace collapsed.
pub fn plain_text_summary(markdown: &str, max_chars: usize) -> String {
    let arena = Arena::new();
    let options = default_options();
    let root = parse_document(&arena, markdown, &options);

    let mut text = String::new();
    collect_text(root, &mut text);

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

fn collect_text<'a>(node: &'a AstNode<'a>, buffer: &mut String) {
    {
        let data = node.data.borrow();
        match &data.value {
            NodeValue::Text(text) => buffer.push_str(text),
            NodeValue::Code(code) => buffer.push_str(&code.literal),
            NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
            NodeValue::CodeBlock(_) | NodeValue::HtmlBlock(_) | NodeValue::HtmlInline(_) => {
                return;
            }
            NodeValue::Paragraph | NodeValue::Heading(_) | NodeValue::Item(_) => buffer.push(' '),
            _ => {}
        }
    }

    let mut child = node.first_child();
    while let Some(next) = child {
        collect_text(next, buffer);
        child = next.next_sibling();
    }
}

#[cfg(test)]
mod tests {
    use super::plain_text_summary;

    #[test]
    fn markup_is_stripped() {
        let summary = plain_text_summary("# Title\n\nSome **bold** and `code`.\n", 100);
        assert_eq!(summary, "Title Some bold and code.");
    }

    #[test]
    fn summary_is_truncated_by_characters() {
        let summary = plain_text_summary("你好世界，这是一段很长的文字", 4);
        assert_eq!(summary, "你好世界");
    }

    #[test]
    fn code_blocks_are_skipped() {
        let summary = plain_text_summary("intro\n\n```\nlet x = 1;\n```\n", 100);
        assert_eq!(summary, "intro");
    }
}
