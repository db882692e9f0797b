//! Table-of-contents markup.
//!
//! The renderer emits a complete `<div class="toc"><ul>…</ul></div>` block;
//! post pages only want the inner list items so the template can supply its
//! own wrapper. [`extract_toc_list`] performs that second step.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::TocEntry;

static TOC_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="toc">\s*<ul>(.*)</ul>\s*</div>"#)
        .expect("toc pattern must be valid")
});

/// Nested list of links for `headings`. Deeper headings open a child list
/// under the preceding entry; shallower ones close lists until a matching
/// depth is found.
pub fn build_toc_block(headings: &[TocEntry]) -> String {
    let mut html = String::from("<div class=\"toc\">\n<ul>");
    if headings.is_empty() {
        html.push_str("</ul>\n</div>\n");
        return html;
    }
    html.push('\n');

    let mut stack: Vec<u8> = Vec::new();
    for entry in headings {
        match stack.last().copied() {
            None => stack.push(entry.level),
            Some(current) if entry.level > current => {
                html.push_str("\n<ul>\n");
                stack.push(entry.level);
            }
            Some(_) => {
                html.push_str("</li>\n");
                while stack.len() > 1 && entry.level <= stack[stack.len() - 2] {
                    stack.pop();
                    html.push_str("</ul>\n</li>\n");
                }
                if let Some(last) = stack.last_mut() {
                    *last = entry.level;
                }
            }
        }

        html.push_str("<li><a href=\"#");
        html.push_str(&escape_html(&entry.anchor));
        html.push_str("\">");
        html.push_str(&escape_html(&entry.title));
        html.push_str("</a>");
    }

    html.push_str("</li>\n");
    for _ in 1..stack.len() {
        html.push_str("</ul>\n</li>\n");
    }
    html.push_str("</ul>\n</div>\n");
    html
}

/// Inner list markup of a TOC block, or `""` when `toc_block` has no
/// `<div class="toc"><ul>` wrapper.
pub fn extract_toc_list(toc_block: &str) -> String {
    TOC_LIST
        .captures(toc_block)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str().to_string())
        .unwrap_or_default()
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: u8, anchor: &str, title: &str) -> TocEntry {
        TocEntry {
            level,
            anchor: anchor.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn nested_headings_produce_nested_lists() {
        let block = build_toc_block(&[
            entry(1, "a", "A"),
            entry(2, "b", "B"),
            entry(2, "c", "C"),
            entry(1, "d", "D"),
        ]);

        assert_eq!(
            block,
            "<div class=\"toc\">\n<ul>\n\
             <li><a href=\"#a\">A</a>\n<ul>\n\
             <li><a href=\"#b\">B</a></li>\n\
             <li><a href=\"#c\">C</a></li>\n\
             </ul>\n</li>\n\
             <li><a href=\"#d\">D</a></li>\n\
             </ul>\n</div>\n"
        );
    }

    #[test]
    fn trailing_deep_heading_closes_every_list() {
        let block = build_toc_block(&[entry(2, "a", "A"), entry(3, "b", "B")]);

        assert_eq!(block.matches("<ul>").count(), block.matches("</ul>").count());
        assert_eq!(block.matches("<li>").count(), block.matches("</li>").count());
    }

    #[test]
    fn titles_are_escaped() {
        let block = build_toc_block(&[entry(2, "x", "a < b & c")]);
        assert!(block.contains(">a &lt; b &amp; c</a>"));
    }

    #[test]
    fn extract_returns_inner_items() {
        let block = build_toc_block(&[entry(1, "a", "A"), entry(1, "b", "B")]);

        assert_eq!(
            extract_toc_list(&block),
            "\n<li><a href=\"#a\">A</a></li>\n<li><a href=\"#b\">B</a></li>\n"
        );
    }

    #[test]
    fn extract_keeps_nested_lists_intact() {
        let block = build_toc_block(&[entry(1, "a", "A"), entry(2, "b", "B")]);
        let inner = extract_toc_list(&block);

        assert!(inner.contains("<ul>"));
        assert!(inner.ends_with("</ul>\n</li>\n"));
    }

    #[test]
    fn extract_without_wrapper_is_empty() {
        assert_eq!(extract_toc_list(""), "");
        assert_eq!(extract_toc_list("<ul><li>x</li></ul>"), "");
        assert_eq!(extract_toc_list(&build_toc_block(&[])), "");
    }
}
