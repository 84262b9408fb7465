//! Plain text import.

use serde_json::json;

use super::{decode_text, truncate_with_ellipsis, ImportOptions, Metadata, Processed, Processor};
use crate::html::html_escape;

pub struct TextProcessor;

impl Processor for TextProcessor {
    fn process(&self, bytes: &[u8], options: &ImportOptions) -> Result<Processed, String> {
        let text = decode_text(bytes).replace("\r\n", "\n");

        let mut metadata = Metadata::new();
        metadata.insert("originalFormat".into(), json!("text/plain"));
        metadata.insert("encoding".into(), json!("utf-8"));
        metadata.insert("lineCount".into(), json!(text.split('\n').count()));
        metadata.insert("characterCount".into(), json!(text.chars().count()));

        Ok(Processed {
            content: text_to_html(&text, options.preserve_line_breaks),
            title: title_from_text(&text),
            metadata,
        })
    }
}

/// Escape and wrap text. Blank lines separate paragraphs; short title-like
/// paragraphs become `<h2>`.
pub fn text_to_html(text: &str, preserve_line_breaks: bool) -> String {
    let escaped = html_escape(text);

    let html = if preserve_line_breaks {
        split_paragraphs(&escaped)
            .into_iter()
            .map(|p| {
                if looks_like_title(&p) {
                    format!("<h2>{}</h2>", p)
                } else {
                    format!("<p>{}</p>", p)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else if escaped.trim().is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>", escaped.replace('\n', "<br>"))
    };

    if html.is_empty() {
        "<p>Documento vazio</p>".to_string()
    } else {
        html
    }
}

/// Paragraphs separated by blank (or whitespace-only) lines, inner line
/// breaks folded into spaces.
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" ").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" ").trim().to_string());
    }
    paragraphs.retain(|p| !p.is_empty());
    paragraphs
}

/// Short, unpunctuated lines read as headings: all caps, containing `_` or
/// `-`, or at most 50 characters.
pub fn looks_like_title(line: &str) -> bool {
    let trimmed = line.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > 80 {
        return false;
    }
    if trimmed.ends_with('.') || trimmed.ends_with('!') || trimmed.ends_with('?') {
        return false;
    }
    let all_caps = trimmed == trimmed.to_uppercase();
    let has_separators = trimmed.contains('_') || trimmed.contains('-');
    all_caps || has_separators || len <= 50
}

fn title_from_text(text: &str) -> Option<String> {
    let first = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(truncate_with_ellipsis(first, 50))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_and_titles() {
        let html = text_to_html("TITULO\n\nUma frase\nquebrada em linhas.\n\n  \n\nFim.", true);
        assert_eq!(html, "<h2>TITULO</h2>\n<p>Uma frase quebrada em linhas.</p>\n<p>Fim.</p>");
    }

    #[test]
    fn test_escapes_markup() {
        let html = text_to_html("a <b> & c.", true);
        assert_eq!(html, "<p>a &lt;b&gt; &amp; c.</p>");
    }

    #[test]
    fn test_without_preserved_breaks() {
        assert_eq!(text_to_html("one\ntwo", false), "<p>one<br>two</p>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(text_to_html("", true), "<p>Documento vazio</p>");
        assert_eq!(text_to_html("  \n \n", false), "<p>Documento vazio</p>");
    }

    #[test]
    fn test_looks_like_title() {
        assert!(looks_like_title("Introdução"));
        assert!(looks_like_title("SECTION_ONE"));
        assert!(!looks_like_title("Ends with a period."));
        assert!(!looks_like_title(""));
        let long = "word ".repeat(20);
        assert!(!looks_like_title(&long));
    }

    #[test]
    fn test_process_sets_title_and_metadata() {
        let long_line = "x".repeat(60);
        let processed = TextProcessor
            .process(format!("\n{}\nmore", long_line).as_bytes(), &ImportOptions::default())
            .unwrap();
        assert_eq!(processed.title.unwrap(), format!("{}...", "x".repeat(50)));
        assert_eq!(processed.metadata["lineCount"], 3);
        assert_eq!(processed.metadata["originalFormat"], "text/plain");
    }
}
