//! DOCX export with `docx-rs`.

use std::io::Cursor;

use docx_rs::{AlignmentType, BreakType, Docx, PageMargin, Paragraph, Run, RunFonts};

use super::ExportOptions;
use crate::error::ExportError;
use crate::html::{extract_headings, html_to_blocks, html_to_text, BlockKind};

/// One inch, in twentieths of a point.
const MARGIN_TWIPS: i32 = 1440;
/// Title run size in half-points (16 pt).
const TITLE_SIZE: usize = 32;

pub fn render(title: &str, content: &str, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let body_size = options.font_size() as usize * 2;

    let mut docx = Docx::new().page_margin(
        PageMargin::new()
            .top(MARGIN_TWIPS)
            .bottom(MARGIN_TWIPS)
            .left(MARGIN_TWIPS)
            .right(MARGIN_TWIPS),
    );

    docx = docx
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(title).bold().size(TITLE_SIZE))
                .align(AlignmentType::Center),
        )
        .add_paragraph(Paragraph::new());

    if options.include_toc {
        for paragraph in table_of_contents(content, body_size) {
            docx = docx.add_paragraph(paragraph);
        }
    }

    for paragraph in body_paragraphs(content, body_size) {
        docx = docx.add_paragraph(paragraph);
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ExportError::Docx(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// "Sumário" page listing the headings, indented by level, then a page break.
fn table_of_contents(content: &str, body_size: usize) -> Vec<Paragraph> {
    let mut paragraphs = vec![Paragraph::new()
        .add_run(Run::new().add_text("Sumário").bold().size(28))
        .align(AlignmentType::Center)];

    let headings = extract_headings(content);
    if headings.is_empty() {
        paragraphs.push(Paragraph::new().add_run(
            Run::new()
                .add_text("O sumário será gerado automaticamente pelo Word com base nos títulos do documento.")
                .italic()
                .size(body_size),
        ));
    }
    for (level, text) in headings {
        let indent = "    ".repeat(level.saturating_sub(1));
        paragraphs.push(
            Paragraph::new().add_run(Run::new().add_text(format!("{}{}", indent, text)).size(body_size)),
        );
    }
    paragraphs.push(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
    paragraphs
}

fn heading_size(level: usize, body_size: usize) -> usize {
    match level {
        1 => 28,
        2 => 24,
        3 => 20,
        _ => body_size,
    }
}

fn body_paragraphs(content: &str, body_size: usize) -> Vec<Paragraph> {
    let blocks = html_to_blocks(content);
    if blocks.is_empty() {
        // Nothing block-shaped: fall back to plain text split on blank lines.
        return html_to_text(content)
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| Paragraph::new().add_run(Run::new().add_text(p).size(body_size)))
            .collect();
    }

    blocks
        .into_iter()
        .map(|block| match block.kind {
            BlockKind::Heading(level) => Paragraph::new().add_run(
                Run::new()
                    .add_text(block.text)
                    .bold()
                    .size(heading_size(level, body_size)),
            ),
            BlockKind::Paragraph => {
                Paragraph::new().add_run(Run::new().add_text(block.text).size(body_size))
            }
            BlockKind::ListItem { ordered, index } => {
                let marker = if ordered {
                    format!("{}.", index)
                } else {
                    "•".to_string()
                };
                Paragraph::new().add_run(
                    Run::new()
                        .add_text(format!("{} {}", marker, block.text))
                        .size(body_size),
                )
            }
            BlockKind::Quote => Paragraph::new().add_run(
                Run::new()
                    .add_text(format!("“{}”", block.text))
                    .italic()
                    .size(body_size),
            ),
            BlockKind::Code => {
                let mut run = Run::new()
                    .fonts(RunFonts::new().ascii("Courier New"))
                    .size(body_size);
                for (i, line) in block.text.lines().enumerate() {
                    if i > 0 {
                        run = run.add_break(BreakType::TextWrapping);
                    }
                    run = run.add_text(line);
                }
                Paragraph::new().add_run(run)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn document_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[test]
    fn test_render_structure() {
        let bytes = render(
            "Meu Documento",
            "<h2>Seção</h2><p>Corpo</p><ol><li>primeiro</li></ol><ul><li>item</li></ul>",
            &ExportOptions::default(),
        )
        .unwrap();
        let xml = document_xml(&bytes);
        assert!(xml.contains("Meu Documento"));
        assert!(xml.contains("Seção"));
        assert!(xml.contains("1. primeiro"));
        assert!(xml.contains("• item"));
        assert!(!xml.contains("Sumário"));
    }

    #[test]
    fn test_table_of_contents() {
        let options = ExportOptions {
            include_toc: true,
            ..ExportOptions::default()
        };
        let xml = document_xml(&render("T", "<h1>Um</h1><h2>Dois</h2>", &options).unwrap());
        assert!(xml.contains("Sumário"));
        assert!(xml.contains("    Dois"));
    }

    #[test]
    fn test_plain_text_fallback() {
        let xml = document_xml(&render("T", "só texto solto", &ExportOptions::default()).unwrap());
        assert!(xml.contains("só texto solto"));
    }
}
