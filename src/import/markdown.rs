//! Markdown import: optional front matter plus GitHub-flavoured Markdown.

use pulldown_cmark::{Event, Options, Parser};
use serde_json::{json, Map, Value};

use super::{decode_text, ImportOptions, Metadata, Processed, Processor};
use crate::html::{count_tags, find_all, parse_fragment, serialize, strip_tags, Node};

pub struct MarkdownProcessor;

impl Processor for MarkdownProcessor {
    fn process(&self, bytes: &[u8], options: &ImportOptions) -> Result<Processed, String> {
        let source = decode_text(bytes).replace("\r\n", "\n");
        let (front_matter, body) = split_front_matter(&source);

        let mut html = render(body);
        if options.process_external_links {
            html = mark_external_links(&html);
        }

        let title = front_matter_field(&front_matter, "title")
            .filter(|t| !t.is_empty())
            .map(String::from)
            .or_else(|| first_heading(body));

        let metadata = extract_metadata(&front_matter, &html);
        Ok(Processed {
            content: html,
            title,
            metadata,
        })
    }
}

// ============================================================================
// Front Matter
// ============================================================================

/// Split a leading `---` block of `key: value` lines from the body.
/// Returns the parsed keys (quotes stripped) and the remaining Markdown.
pub fn split_front_matter(source: &str) -> (Vec<(String, String)>, &str) {
    let mut fields = Vec::new();
    let Some(rest) = source.strip_prefix("---") else {
        return (fields, source);
    };
    let Some(first_nl) = rest.find('\n') else {
        return (fields, source);
    };
    if !rest[..first_nl].trim().is_empty() {
        return (fields, source);
    }
    let block = &rest[first_nl + 1..];

    let mut offset = 0;
    let mut end = None;
    for line in block.split_inclusive('\n') {
        if line.trim_end() == "---" {
            end = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let Some((yaml_end, body_start)) = end else {
        return (fields, source);
    };

    for line in block[..yaml_end].lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            fields.push((key.to_string(), value.to_string()));
        }
    }
    (fields, &block[body_start..])
}

pub fn front_matter_field<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ============================================================================
// Rendering
// ============================================================================

/// Markdown to sanitised HTML. Single newlines become `<br>`.
pub fn render(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    ammonia::clean(&html_output)
}

/// Open absolute http(s) links in a new tab.
fn mark_external_links(html: &str) -> String {
    let mut nodes = parse_fragment(html);
    mark_links(&mut nodes);
    serialize(&nodes)
}

fn mark_links(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            if el.tag == "a" {
                let external = el
                    .attr("href")
                    .is_some_and(|h| h.starts_with("http://") || h.starts_with("https://"));
                if external {
                    el.set_attr("target", "_blank");
                    el.set_attr("rel", "noopener noreferrer");
                }
            }
            mark_links(&mut el.children);
        }
    }
}

fn first_heading(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn extract_metadata(front_matter: &[(String, String)], html: &str) -> Metadata {
    let nodes = parse_fragment(html);
    let mut metadata = Metadata::new();
    metadata.insert("originalFormat".into(), json!("text/markdown"));

    if !front_matter.is_empty() {
        let fm: Map<String, Value> = front_matter
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        for key in ["author", "date", "tags", "description"] {
            if let Some(v) = fm.get(key) {
                metadata.insert(key.into(), v.clone());
            }
        }
        metadata.insert("frontMatter".into(), Value::Object(fm));
    }

    let mut headings = Map::new();
    for level in 1..=6 {
        let tag = format!("h{}", level);
        headings.insert(tag.clone(), json!(count_tags(&nodes, &[tag.as_str()])));
    }
    metadata.insert("headings".into(), Value::Object(headings));

    let code_blocks = find_all(&nodes, &|e| {
        e.tag == "pre" && e.children.iter().any(|c| matches!(c, Node::Element(code) if code.tag == "code"))
    })
    .len();
    let tables = count_tags(&nodes, &["table"]);
    let images = count_tags(&nodes, &["img"]);

    metadata.insert("paragraphs".into(), json!(count_tags(&nodes, &["p"])));
    metadata.insert("images".into(), json!(images));
    metadata.insert("links".into(), json!(count_tags(&nodes, &["a"])));
    metadata.insert("codeBlocks".into(), json!(code_blocks));
    metadata.insert("tables".into(), json!(tables));
    metadata.insert("lists".into(), json!(count_tags(&nodes, &["ul", "ol"])));

    let plain = strip_tags(html);
    metadata.insert("characters".into(), json!(plain.trim().chars().count()));
    metadata.insert("words".into(), json!(plain.split_whitespace().count()));

    metadata.insert("hasFrontMatter".into(), json!(!front_matter.is_empty()));
    metadata.insert("hasCodeBlocks".into(), json!(code_blocks > 0));
    metadata.insert("hasTables".into(), json!(tables > 0));
    metadata.insert("hasImages".into(), json!(images > 0));
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_matter() {
        let src = "---\ntitle: \"Meu Título\"\nauthor: 'Ana'\n# comment\n---\n# Heading\n\nBody";
        let (fm, body) = split_front_matter(src);
        assert_eq!(front_matter_field(&fm, "title"), Some("Meu Título"));
        assert_eq!(front_matter_field(&fm, "author"), Some("Ana"));
        assert_eq!(body, "# Heading\n\nBody");
    }

    #[test]
    fn test_no_front_matter() {
        let (fm, body) = split_front_matter("# Just text");
        assert!(fm.is_empty());
        assert_eq!(body, "# Just text");

        let (fm, body) = split_front_matter("---\nunterminated: yes\n");
        assert!(fm.is_empty());
        assert!(body.starts_with("---"));
    }

    #[test]
    fn test_gfm_rendering() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn test_raw_html_is_sanitised() {
        let html = render("Hello <script>alert(1)</script> <a href=\"javascript:x()\">x</a>");
        assert!(!html.contains("<script"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn test_external_links_open_in_new_tab() {
        let processed = MarkdownProcessor
            .process(b"[out](https://example.com) and [in](/local)", &ImportOptions::default())
            .unwrap();
        let nodes = parse_fragment(&processed.content);
        let links = find_all(&nodes, &|e| e.tag == "a");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].attr("target"), Some("_blank"));
        assert_eq!(links[0].attr("rel"), Some("noopener noreferrer"));
        assert_eq!(links[1].attr("href"), Some("/local"));
        assert_eq!(links[1].attr("target"), None);
    }

    #[test]
    fn test_title_and_metadata() {
        let src = b"# Guia\n\nTexto com ![img](a.png).\n\n```rust\nfn main() {}\n```\n\n- a\n- b\n";
        let processed = MarkdownProcessor.process(src, &ImportOptions::default()).unwrap();
        assert_eq!(processed.title.as_deref(), Some("Guia"));
        let meta = &processed.metadata;
        assert_eq!(meta["headings"]["h1"], 1);
        assert_eq!(meta["codeBlocks"], 1);
        assert_eq!(meta["images"], 1);
        assert_eq!(meta["lists"], 1);
        assert_eq!(meta["hasFrontMatter"], false);
    }

    #[test]
    fn test_front_matter_title_wins() {
        let processed = MarkdownProcessor
            .process(b"---\ntitle: Front\n---\n# Heading\n", &ImportOptions::default())
            .unwrap();
        assert_eq!(processed.title.as_deref(), Some("Front"));
        assert_eq!(processed.metadata["frontMatter"]["title"], "Front");
    }
}
