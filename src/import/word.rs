//! Word (.docx) import.
//!
//! The package is opened with `zip`; `word/document.xml` and
//! `docProps/core.xml` are read with `roxmltree`. Paragraph styles map to
//! headings, run properties to inline formatting, numbered paragraphs to list
//! items and tables to tables.

use std::io::{Cursor, Read};

use roxmltree::{Document, Node};
use serde_json::json;

use super::{truncate_with_ellipsis, ImportOptions, Metadata, Processed, Processor};
use crate::html::{collapse_spaces, html_escape};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub struct WordProcessor;

impl Processor for WordProcessor {
    fn process(&self, bytes: &[u8], options: &ImportOptions) -> Result<Processed, String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|_| {
            "O arquivo não é um documento Word moderno (.docx). Documentos .doc antigos não são suportados; salve o arquivo como .docx e tente novamente".to_string()
        })?;

        let document_xml = read_entry(&mut archive, "word/document.xml")?
            .ok_or_else(|| "word/document.xml não encontrado no arquivo".to_string())?;
        let core_xml = read_entry(&mut archive, "docProps/core.xml")?;

        let doc = Document::parse(&document_xml).map_err(|e| format!("XML inválido: {}", e))?;
        let converted = convert_body(&doc, options.preserve_line_breaks);

        let mut metadata = Metadata::new();
        metadata.insert(
            "originalFormat".into(),
            json!("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        );
        let core = core_xml.as_deref().map(parse_core_properties).unwrap_or_default();
        for (key, value) in &core {
            metadata.insert(key.clone(), json!(value));
        }
        metadata.insert("paragraphs".into(), json!(converted.paragraphs));
        metadata.insert("headings".into(), json!(converted.headings));
        metadata.insert("tables".into(), json!(converted.tables));
        metadata.insert("listItems".into(), json!(converted.list_items));
        metadata.insert("images".into(), json!(converted.images));

        let core_title = core
            .iter()
            .find(|(k, _)| k == "title")
            .map(|(_, v)| v.clone());
        let title = converted
            .first_heading
            .clone()
            .filter(|h| h.chars().count() <= 100)
            .or(core_title)
            .or_else(|| {
                converted
                    .first_paragraph
                    .as_deref()
                    .map(|p| truncate_with_ellipsis(p, 50))
            });

        let content = if converted.html.trim().is_empty() {
            "<p>Documento Word vazio</p>".to_string()
        } else {
            converted.html
        };

        Ok(Processed {
            content,
            title,
            metadata,
        })
    }
}

fn read_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, String> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(format!("Falha ao ler {}: {}", name, e)),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| format!("Falha ao ler {}: {}", name, e))?;
    Ok(Some(xml))
}

// ============================================================================
// Body Conversion
// ============================================================================

#[derive(Default)]
struct Converted {
    html: String,
    paragraphs: usize,
    headings: usize,
    tables: usize,
    list_items: usize,
    images: usize,
    first_heading: Option<String>,
    first_paragraph: Option<String>,
}

fn is_w(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn w_val<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.attribute((W_NS, "val")).or_else(|| node.attribute("val"))
}

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_w(c, name))
}

fn convert_body(doc: &Document, preserve_line_breaks: bool) -> Converted {
    let mut out = Converted::default();
    let Some(body) = doc.descendants().find(|n| is_w(n, "body")) else {
        return out;
    };

    let mut in_list = false;
    for block in body.children().filter(|n| n.is_element()) {
        let is_list_item = is_w(&block, "p") && paragraph_is_list_item(&block);
        if in_list && !is_list_item {
            out.html.push_str("</ul>\n");
            in_list = false;
        }

        if is_w(&block, "p") {
            let inline = paragraph_inline(&block, preserve_line_breaks);
            let text = collapse_spaces(&paragraph_text(&block));
            out.images += block.descendants().filter(|n| is_w(n, "drawing") || is_w(n, "pict")).count();

            if is_list_item {
                if !in_list {
                    out.html.push_str("<ul>\n");
                    in_list = true;
                }
                out.list_items += 1;
                out.html.push_str(&format!("<li>{}</li>\n", inline));
                continue;
            }
            if text.is_empty() {
                continue;
            }
            match heading_level(&block) {
                Some(level) => {
                    out.headings += 1;
                    if out.first_heading.is_none() {
                        out.first_heading = Some(text.clone());
                    }
                    out.html.push_str(&format!("<h{0}>{1}</h{0}>\n", level, inline));
                }
                None => {
                    out.paragraphs += 1;
                    if out.first_paragraph.is_none() {
                        out.first_paragraph = Some(text.clone());
                    }
                    out.html.push_str(&format!("<p>{}</p>\n", inline));
                }
            }
        } else if is_w(&block, "tbl") {
            out.tables += 1;
            out.html.push_str(&convert_table(&block, preserve_line_breaks));
        }
    }
    if in_list {
        out.html.push_str("</ul>\n");
    }
    out.html = out.html.trim_end().to_string();
    out
}

/// `Title` and `Heading1`..`Heading6` paragraph styles (also the localised
/// `Ttulo1` style ids Word writes for Portuguese templates).
fn heading_level(paragraph: &Node) -> Option<usize> {
    let style = child(paragraph, "pPr")
        .and_then(|ppr| child(&ppr, "pStyle"))
        .and_then(|s| w_val(&s))?;
    let lower = style.to_ascii_lowercase();
    if lower == "title" {
        return Some(1);
    }
    let digits = lower
        .strip_prefix("heading")
        .or_else(|| lower.strip_prefix("ttulo"))?;
    match digits.trim().parse::<usize>() {
        Ok(level) if (1..=6).contains(&level) => Some(level),
        _ => None,
    }
}

fn paragraph_is_list_item(paragraph: &Node) -> bool {
    child(paragraph, "pPr").is_some_and(|ppr| child(&ppr, "numPr").is_some())
}

fn paragraph_text(paragraph: &Node) -> String {
    paragraph
        .descendants()
        .filter(|n| is_w(n, "t"))
        .filter_map(|n| n.text())
        .collect()
}

/// A toggle property is on unless its `val` says otherwise.
fn toggle_on(rpr: &Node, name: &str) -> bool {
    match child(rpr, name) {
        Some(prop) => !matches!(w_val(&prop), Some("0") | Some("false") | Some("none")),
        None => false,
    }
}

fn paragraph_inline(paragraph: &Node, preserve_line_breaks: bool) -> String {
    let mut html = String::new();
    for run in paragraph.descendants().filter(|n| is_w(n, "r")) {
        let mut text = String::new();
        for part in run.children().filter(|n| n.is_element()) {
            match part.tag_name().name() {
                "t" => text.push_str(&html_escape(part.text().unwrap_or_default())),
                "tab" => text.push(' '),
                "br" | "cr" => text.push_str(if preserve_line_breaks { "<br>" } else { " " }),
                _ => {}
            }
        }
        if text.is_empty() {
            continue;
        }

        let (mut open, mut close) = (String::new(), String::new());
        if let Some(rpr) = child(&run, "rPr") {
            for (prop, tag) in [("b", "strong"), ("i", "em"), ("u", "u"), ("strike", "s")] {
                if toggle_on(&rpr, prop) {
                    open.push_str(&format!("<{}>", tag));
                    close.insert_str(0, &format!("</{}>", tag));
                }
            }
        }
        html.push_str(&open);
        html.push_str(&text);
        html.push_str(&close);
    }
    html
}

fn convert_table(table: &Node, preserve_line_breaks: bool) -> String {
    let mut html = String::from("<table>\n");
    for row in table.children().filter(|n| is_w(n, "tr")) {
        html.push_str("<tr>");
        for cell in row.children().filter(|n| is_w(n, "tc")) {
            let parts: Vec<String> = cell
                .children()
                .filter(|n| is_w(n, "p"))
                .map(|p| paragraph_inline(&p, preserve_line_breaks))
                .filter(|p| !p.is_empty())
                .collect();
            html.push_str(&format!("<td>{}</td>", parts.join("<br>")));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}

// ============================================================================
// Core Properties
// ============================================================================

/// Non-empty Dublin Core fields from `docProps/core.xml`, renamed to the
/// metadata keys used elsewhere.
fn parse_core_properties(xml: &str) -> Vec<(String, String)> {
    let Ok(doc) = Document::parse(xml) else {
        return Vec::new();
    };
    let mapping = [
        ("title", "title"),
        ("subject", "subject"),
        ("creator", "author"),
        ("keywords", "keywords"),
        ("description", "description"),
        ("lastModifiedBy", "lastModifiedBy"),
        ("created", "created"),
        ("modified", "modified"),
    ];
    let mut fields = Vec::new();
    for (element, key) in mapping {
        let value = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == element)
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(value) = value {
            fields.push((key.to_string(), value.to_string()));
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx(document: &str, core: Option<&str>) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        if let Some(core) = core {
            writer.start_file("docProps/core.xml", options).unwrap();
            writer.write_all(core.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
            W_NS, inner
        )
    }

    const CORE: &str = r#"<?xml version="1.0"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Core Title</dc:title><dc:creator>Ana</dc:creator><dc:subject></dc:subject></cp:coreProperties>"#;

    #[test]
    fn test_structure() {
        let xml = body(concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Capítulo</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>forte</w:t></w:r><w:r><w:rPr><w:i/><w:b w:val="0"/></w:rPr><w:t xml:space="preserve"> e leve &lt;x&gt;</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:t>um</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:t>dois</w:t></w:r></w:p>"#,
            r#"<w:p></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        ));
        let processed = WordProcessor
            .process(&docx(&xml, Some(CORE)), &ImportOptions::default())
            .unwrap();

        assert_eq!(
            processed.content,
            "<h1>Capítulo</h1>\n<p><strong>forte</strong><em> e leve &lt;x&gt;</em></p>\n<ul>\n<li>um</li>\n<li>dois</li>\n</ul>\n<table>\n<tr><td>A</td><td>B</td></tr>\n</table>"
        );
        assert_eq!(processed.title.as_deref(), Some("Capítulo"));
        let meta = &processed.metadata;
        assert_eq!(meta["author"], "Ana");
        assert_eq!(meta["title"], "Core Title");
        assert!(meta.get("subject").is_none());
        assert_eq!(meta["headings"], 1);
        assert_eq!(meta["listItems"], 2);
        assert_eq!(meta["tables"], 1);
    }

    #[test]
    fn test_title_falls_back_to_core_then_paragraph() {
        let xml = body(r#"<w:p><w:r><w:t>Um parágrafo bastante longo que certamente passa de cinquenta caracteres</w:t></w:r></w:p>"#);
        let with_core = WordProcessor
            .process(&docx(&xml, Some(CORE)), &ImportOptions::default())
            .unwrap();
        assert_eq!(with_core.title.as_deref(), Some("Core Title"));

        let without_core = WordProcessor.process(&docx(&xml, None), &ImportOptions::default()).unwrap();
        let title = without_core.title.unwrap();
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 53);
    }

    #[test]
    fn test_line_breaks() {
        let xml = body(r#"<w:p><w:r><w:t>a</w:t><w:br/><w:t>b</w:t></w:r></w:p>"#);
        let bytes = docx(&xml, None);
        let kept = WordProcessor.process(&bytes, &ImportOptions::default()).unwrap();
        assert_eq!(kept.content, "<p>a<br>b</p>");

        let options = ImportOptions {
            preserve_line_breaks: false,
            ..ImportOptions::default()
        };
        let folded = WordProcessor.process(&bytes, &options).unwrap();
        assert_eq!(folded.content, "<p>a b</p>");
    }

    #[test]
    fn test_empty_document() {
        let processed = WordProcessor
            .process(&docx(&body(""), None), &ImportOptions::default())
            .unwrap();
        assert_eq!(processed.content, "<p>Documento Word vazio</p>");
        assert!(processed.title.is_none());
    }

    #[test]
    fn test_rejects_legacy_doc() {
        let err = WordProcessor
            .process(b"\xd0\xcf\x11\xe0 legacy", &ImportOptions::default())
            .unwrap_err();
        assert!(err.contains(".docx"));
    }

    #[test]
    fn test_missing_document_part() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"x").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(WordProcessor.process(&bytes, &ImportOptions::default()).is_err());
    }
}
