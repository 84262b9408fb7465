//! HTML import. Pages are reduced to their article body before they reach
//! the editor.

use serde_json::{json, Map, Value};

use super::{decode_text, ImportOptions, Metadata, Processed, Processor};
use crate::html::{
    collapse_spaces, count_tags, find_all, find_first, parse_fragment, remove_empty_elements,
    sanitize_import, serialize, Element, Node,
};

pub struct HtmlProcessor;

impl Processor for HtmlProcessor {
    fn process(&self, bytes: &[u8], options: &ImportOptions) -> Result<Processed, String> {
        let source = decode_text(bytes);
        let nodes = parse_fragment(&source);
        let metadata = extract_metadata(&nodes);
        let title = metadata
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(String::from);

        let body = if options.extract_body_only {
            match find_first(&nodes, "body") {
                Some(body) => serialize(&body.children),
                None => serialize(&nodes),
            }
        } else {
            serialize(&nodes)
        };

        Ok(Processed {
            content: convert_for_editor(&body),
            title,
            metadata,
        })
    }
}

/// Sanitise and strip page chrome; drop empty elements; make sure the
/// result has at least one paragraph or heading.
pub fn convert_for_editor(html: &str) -> String {
    let cleaned = sanitize_import(html, true);
    let mut nodes = parse_fragment(&cleaned);
    remove_empty_elements(&mut nodes);
    let content = serialize(&nodes).trim().to_string();

    if content.is_empty() {
        return "<p>Documento HTML vazio</p>".to_string();
    }
    let has_blocks = count_tags(&nodes, &["p", "h1", "h2", "h3", "h4", "h5", "h6"]) > 0;
    if has_blocks {
        content
    } else {
        format!("<p>{}</p>", content)
    }
}

fn meta_content<'a>(nodes: &'a [Node], name: &str) -> Option<&'a str> {
    find_all(nodes, &|e: &Element| {
        e.tag == "meta" && e.attr("name").is_some_and(|n| n.eq_ignore_ascii_case(name))
    })
    .into_iter()
    .next()
    .and_then(|e| e.attr("content"))
}

fn extract_metadata(nodes: &[Node]) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("originalFormat".into(), json!("text/html"));

    if let Some(title) = find_first(nodes, "title") {
        metadata.insert("title".into(), json!(collapse_spaces(&title.text())));
    }
    if let Some(description) = meta_content(nodes, "description") {
        metadata.insert("description".into(), json!(description));
    }
    if let Some(keywords) = meta_content(nodes, "keywords") {
        let list: Vec<&str> = keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        metadata.insert("keywords".into(), json!(list));
    }
    if let Some(author) = meta_content(nodes, "author") {
        metadata.insert("author".into(), json!(author));
    }

    let mut headings = Map::new();
    for level in 1..=6 {
        let tag = format!("h{}", level);
        headings.insert(tag.clone(), json!(count_tags(nodes, &[tag.as_str()])));
    }
    metadata.insert("headings".into(), Value::Object(headings));
    metadata.insert("paragraphs".into(), json!(count_tags(nodes, &["p"])));
    metadata.insert("images".into(), json!(count_tags(nodes, &["img"])));
    metadata.insert("links".into(), json!(count_tags(nodes, &["a"])));
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>  Página de Teste </title>
  <meta name="description" content="Uma descrição">
  <meta name="keywords" content="a, b ,,c">
  <meta name="author" content="Ana">
  <style>body { color: red }</style>
  <script>alert('x')</script>
</head>
<body onload="evil()">
  <nav><a href="/">Home</a></nav>
  <header><h1>Site</h1></header>
  <h1 class="big" style="color: blue">Artigo</h1>
  <p onclick="steal()">Texto <a href="javascript:alert(1)">link</a></p>
  <p>   </p>
  <form><input name="q"><button>Go</button></form>
  <footer>Rodapé</footer>
</body>
</html>"#;

    #[test]
    fn test_metadata() {
        let processed = HtmlProcessor.process(PAGE.as_bytes(), &ImportOptions::default()).unwrap();
        assert_eq!(processed.title.as_deref(), Some("Página de Teste"));
        let meta = &processed.metadata;
        assert_eq!(meta["description"], "Uma descrição");
        assert_eq!(meta["keywords"], json!(["a", "b", "c"]));
        assert_eq!(meta["author"], "Ana");
        assert_eq!(meta["headings"]["h1"], 2);
    }

    #[test]
    fn test_content_is_clean() {
        let processed = HtmlProcessor.process(PAGE.as_bytes(), &ImportOptions::default()).unwrap();
        let content = &processed.content;
        for forbidden in ["<script", "onclick", "onload", "javascript:", "style=", "class=", "Home", "Site", "Rodapé", "<form", "<input", "Página de Teste"] {
            assert!(!content.contains(forbidden), "{} leaked into {}", forbidden, content);
        }
        assert!(content.contains("<h1>Artigo</h1>"));
        assert!(content.contains("Texto"));
        assert!(!content.contains("<p> </p>"));
    }

    #[test]
    fn test_named_entities_are_decoded() {
        let processed = HtmlProcessor
            .process(
                "<html><body><p>It&rsquo;s M&uuml;ller &euro;5 &ldquo;ok&rdquo;</p></body></html>".as_bytes(),
                &ImportOptions::default(),
            )
            .unwrap();
        assert!(!processed.content.contains("&amp;"), "{}", processed.content);
        assert!(processed.content.contains("It’s Müller €5 “ok”"), "{}", processed.content);
    }

    #[test]
    fn test_fragment_without_blocks_is_wrapped() {
        assert_eq!(convert_for_editor("just <b>text</b>"), "<p>just <b>text</b></p>");
    }

    #[test]
    fn test_empty_page() {
        let processed = HtmlProcessor
            .process(b"<html><body><div> </div></body></html>", &ImportOptions::default())
            .unwrap();
        assert_eq!(processed.content, "<p>Documento HTML vazio</p>");
        assert!(processed.title.is_none());
    }
}
