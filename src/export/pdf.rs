//! PDF export with `lopdf`.
//!
//! Layout is in millimetres from the top-left corner, like a printed page,
//! and converted to PDF points at the last moment. Text uses the built-in
//! Helvetica faces with WinAnsi encoding, so no fonts are embedded; widths
//! for wrapping come from the standard Helvetica metrics.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use super::{ExportOptions, Palette, Rgb};
use crate::error::ExportError;
use crate::html::html_to_print_text;

const PT_PER_MM: f32 = 72.0 / 25.4;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 7.0;
const TITLE_Y_MM: f32 = 25.0;
const TITLE_LINE_MM: f32 = 8.0;
const RULE_Y_MM: f32 = 30.0;
const BODY_TOP_MM: f32 = 40.0;
const RULE_WIDTH_MM: f32 = 0.5;
const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 12.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

pub fn render(
    title: &str,
    content: &str,
    options: &ExportOptions,
    palette: &Palette,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let (width_mm, height_mm) = options.page_mm();
    let page = Page {
        width_mm,
        height_mm,
        palette: *palette,
    };
    let text_width_pt = (width_mm - 2.0 * MARGIN_MM) * PT_PER_MM;

    let mut pages = Vec::new();
    let mut ops = page.start();

    // Title, centred; long titles wrap and push the body down.
    let title_lines = wrap_text(title, text_width_pt, TITLE_SIZE, true);
    let extra_mm = title_lines.len().saturating_sub(1) as f32 * TITLE_LINE_MM;
    for (i, line) in title_lines.iter().enumerate() {
        let x_pt = (width_mm * PT_PER_MM - text_width(line, TITLE_SIZE, true)) / 2.0;
        let y_mm = TITLE_Y_MM + i as f32 * TITLE_LINE_MM;
        ops.extend(page.text(BOLD, TITLE_SIZE, x_pt.max(MARGIN_MM * PT_PER_MM), y_mm, line));
    }
    ops.extend(page.rule(RULE_Y_MM + extra_mm));

    let body = html_to_print_text(content);
    let mut y_mm = BODY_TOP_MM + extra_mm;
    for line in wrap_text(&body, text_width_pt, BODY_SIZE, false) {
        if y_mm + LINE_HEIGHT_MM > height_mm - MARGIN_MM {
            pages.push(std::mem::replace(&mut ops, page.start()));
            y_mm = MARGIN_MM;
        }
        if !line.is_empty() {
            ops.extend(page.text(REGULAR, BODY_SIZE, MARGIN_MM * PT_PER_MM, y_mm, &line));
        }
        y_mm += LINE_HEIGHT_MM;
    }
    pages.push(ops);

    let info = options.include_metadata.then(|| {
        dictionary! {
            "Title" => text_string(title),
            "Subject" => text_string("Documento Docs"),
            "Author" => text_string("Docs"),
            "Creator" => text_string("Docs"),
            "Producer" => text_string("Docs (lopdf)"),
            "Keywords" => text_string("documento, docs, export"),
            "CreationDate" => Object::string_literal(now.format("D:%Y%m%d%H%M%SZ").to_string()),
        }
    });
    assemble(pages, width_mm, height_mm, info)
}

// ============================================================================
// Page Drawing
// ============================================================================

struct Page {
    width_mm: f32,
    height_mm: f32,
    palette: Palette,
}

impl Page {
    fn width_pt(&self) -> f32 {
        self.width_mm * PT_PER_MM
    }

    fn height_pt(&self) -> f32 {
        self.height_mm * PT_PER_MM
    }

    /// Baseline `y_mm` from the top, in PDF points from the bottom.
    fn y_pt(&self, y_mm: f32) -> f32 {
        self.height_pt() - y_mm * PT_PER_MM
    }

    /// Every page starts by painting the theme background.
    fn start(&self) -> Vec<Operation> {
        vec![
            Operation::new("q", vec![]),
            fill_color(self.palette.background),
            Operation::new(
                "re",
                vec![0.0f32.into(), 0.0f32.into(), self.width_pt().into(), self.height_pt().into()],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]
    }

    fn text(&self, font: &str, size: f32, x_pt: f32, y_mm: f32, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            fill_color(self.palette.text),
            Operation::new("Td", vec![x_pt.into(), self.y_pt(y_mm).into()]),
            Operation::new("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]
    }

    fn rule(&self, y_mm: f32) -> Vec<Operation> {
        let [r, g, b] = self.palette.text.unit();
        let y = self.y_pt(y_mm);
        vec![
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("w", vec![(RULE_WIDTH_MM * PT_PER_MM).into()]),
            Operation::new("m", vec![(MARGIN_MM * PT_PER_MM).into(), y.into()]),
            Operation::new("l", vec![(self.width_pt() - MARGIN_MM * PT_PER_MM).into(), y.into()]),
            Operation::new("S", vec![]),
        ]
    }
}

fn fill_color(color: Rgb) -> Operation {
    let [r, g, b] = color.unit();
    Operation::new("rg", vec![r.into(), g.into(), b.into()])
}

fn assemble(
    pages: Vec<Vec<Operation>>,
    width_mm: f32,
    height_mm: f32,
    info: Option<lopdf::Dictionary>,
) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let encoded = Content { operations }
            .encode()
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![
        0.0f32.into(),
        0.0f32.into(),
        (width_mm * PT_PER_MM).into(),
        (height_mm * PT_PER_MM).into(),
    ];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(info) = info {
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }

    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(bytes)
}

// ============================================================================
// Text
// ============================================================================

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Bold glyphs run slightly wider than the regular metrics.
const BOLD_FACTOR: f32 = 1.07;

fn char_width(c: char) -> u16 {
    match c as u32 {
        code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => 556,
    }
}

pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    let width = units as f32 * size / 1000.0;
    if bold { width * BOLD_FACTOR } else { width }
}

/// Greedy word wrap. Source newlines are kept (blank lines included); words
/// wider than a whole line are split between characters.
pub fn wrap_text(text: &str, max_width: f32, size: f32, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for source_line in text.split('\n') {
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, size, bold) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, size, bold) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width(&current, size, bold) > max_width {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Encode for a WinAnsi font; characters outside it become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Info dictionary string: literal for ASCII, UTF-16BE with a byte order mark
/// otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Theme;
    use crate::import::{pdf::PdfProcessor, ImportOptions, Processor};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn dark() -> Palette {
        Palette::for_theme(Theme::Dark, "").unwrap()
    }

    #[test]
    fn test_wrap_text() {
        let width = text_width("aaaa aaaa", 12.0, false);
        let lines = wrap_text("aaaa aaaa aaaa\n\nb", width, 12.0, false);
        assert_eq!(lines, vec!["aaaa aaaa", "aaaa", "", "b"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let width = text_width("aaaa", 12.0, false);
        let lines = wrap_text("aaaaaaaaaa", width, 12.0, false);
        assert_eq!(lines, vec!["aaaa", "aaaa", "aa"]);
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Aé•€✓"), vec![b'A', 0xE9, 0x95, 0x80, b'?']);
    }

    #[test]
    fn test_render_is_loadable() {
        let bytes = render("Título", "<h1>Resumo</h1><p>Texto</p>", &ExportOptions::default(), &dark(), now()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let info = match doc.trailer.get(b"Info").unwrap() {
            Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
            other => panic!("unexpected Info {:?}", other),
        };
        assert!(matches!(info.get(b"Title"), Ok(Object::String(..))));
    }

    #[test]
    fn test_no_info_without_metadata() {
        let options = ExportOptions {
            include_metadata: false,
            ..ExportOptions::default()
        };
        let bytes = render("T", "<p>x</p>", &options, &dark(), now()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.trailer.get(b"Info").is_err());
    }

    #[test]
    fn test_long_content_paginates() {
        let content: String = (0..120).map(|i| format!("<p>Linha {}</p>", i)).collect();
        let bytes = render("T", &content, &ExportOptions::default(), &dark(), now()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn test_text_survives_reimport() {
        let bytes = render("Relatorio", "<p>Conteudo exportado.</p>", &ExportOptions::default(), &dark(), now()).unwrap();
        let options = ImportOptions {
            preserve_pages: false,
            ..ImportOptions::default()
        };
        let processed = PdfProcessor.process(&bytes, &options).unwrap();
        assert!(processed.content.contains("Conteudo"));
        assert_eq!(processed.title.as_deref(), Some("Relatorio"));
    }
}
