use std::{collections::VecDeque, fmt, sync::Mutex};

use comrak::adapters::{HeadingAdapter, HeadingMeta};
use comrak::nodes::Sourcepos;

use crate::application::render::types::TocEntry;

/// Writes Markdown headings with the anchors collected by the AST walk.
///
/// comrak renders headings in the same document order the walk visited them,
/// so each opening tag takes the next anchor. Raw HTML headings never reach
/// the adapter and keep whatever markup the author wrote.
pub(crate) struct AnchoredHeadings {
    anchors: Mutex<VecDeque<String>>,
}

impl AnchoredHeadings {
    pub(crate) fn new(headings: &[TocEntry]) -> Self {
        Self {
            anchors: Mutex::new(headings.iter().map(|entry| entry.anchor.clone()).collect()),
        }
    }

    fn next_anchor(&self) -> Option<String> {
        self.anchors
            .lock()
            .ok()
            .and_then(|mut anchors| anchors.pop_front())
    }
}

impl HeadingAdapter for AnchoredHeadings {
    fn enter(
        &self,
        output: &mut dyn fmt::Write,
        heading: &HeadingMeta,
        _sourcepos: Option<Sourcepos>,
    ) -> fmt::Result {
        match self.next_anchor() {
            Some(anchor) => write!(output, "<h{} id=\"{}\">", heading.level, anchor),
            None => write!(output, "<h{}>", heading.level),
        }
    }

    fn exit(&self, output: &mut dyn fmt::Write, heading: &HeadingMeta) -> fmt::Result {
        write!(output, "</h{}>", heading.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: u8, anchor: &str) -> TocEntry {
        TocEntry {
            level,
            anchor: anchor.to_string(),
            title: anchor.to_string(),
        }
    }

    fn meta(level: u8) -> HeadingMeta {
        HeadingMeta {
            level,
            content: String::new(),
        }
    }

    #[test]
    fn anchors_are_handed_out_in_order() {
        let adapter = AnchoredHeadings::new(&[entry(1, "a"), entry(2, "b")]);
        let mut html = String::new();

        adapter.enter(&mut html, &meta(1), None).expect("write");
        adapter.exit(&mut html, &meta(1)).expect("write");
        adapter.enter(&mut html, &meta(2), None).expect("write");
        adapter.exit(&mut html, &meta(2)).expect("write");

        assert_eq!(html, "<h1 id=\"a\"></h1><h2 id=\"b\"></h2>");
    }

    #[test]
    fn exhausted_anchors_render_plain_tags() {
        let adapter = AnchoredHeadings::new(&[]);
        let mut html = String::new();

        adapter.enter(&mut html, &meta(3), None).expect("write");

        assert_eq!(html, "<h3>");
    }
}
