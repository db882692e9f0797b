use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

/// Highlight a fenced block into `<div class="codehilite"><pre><code>…` with
/// class-based token spans, so themes live entirely in CSS.
pub(crate) fn highlight_code(
    language: Option<&str>,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, RenderError> {
    let lang_token = language.unwrap_or("text");
    let syntax =
        find_syntax(syntax_set, lang_token).unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, *class_style);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| RenderError::Highlighting {
                language: lang_token.to_string(),
                message: err.to_string(),
            })?;
    }

    let highlighted = generator.finalize();
    let lang = ammonia::clean_text(&lang_token.to_ascii_lowercase());

    Ok(format!(
        "<div class=\"codehilite\"><pre data-language=\"{lang}\"><code class=\"language-{lang}\">{highlighted}</code></pre></div>"
    ))
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(&lowercase))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_and_style() -> (SyntaxSet, ClassStyle) {
        (
            SyntaxSet::load_defaults_newlines(),
            ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        )
    }

    #[test]
    fn known_language_emits_token_classes() {
        let (syntax_set, style) = syntax_and_style();
        let html = highlight_code(Some("rust"), "fn main() {}", &syntax_set, &style)
            .expect("highlighted");

        assert!(html.starts_with("<div class=\"codehilite\">"));
        assert!(html.contains("language-rust"));
        assert!(html.contains("syntax-"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let (syntax_set, style) = syntax_and_style();
        let html = highlight_code(Some("klingon"), "<qapla'>", &syntax_set, &style)
            .expect("highlighted");

        assert!(html.contains("language-klingon"));
        assert!(html.contains("&lt;qapla&#39;&gt;") || html.contains("&lt;qapla'&gt;"));
    }
}
