//! Document export.
//!
//! A stored document's HTML is rendered into one of five formats. PDF and
//! DOCX are generated natively; if generation fails the caller still gets a
//! printable HTML file instead of an error.

pub mod docx;
pub mod html;
pub mod pdf;
pub mod text;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::models::Document;

/// File name of the full backup.
pub const BACKUP_FILENAME: &str = "document_app_export.json";

pub const DEFAULT_CUSTOM_COLOR: &str = "#1C1F23";

// ============================================================================
// Formats and Options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Html,
    Txt,
    Md,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Pdf,
        ExportFormat::Docx,
        ExportFormat::Html,
        ExportFormat::Txt,
        ExportFormat::Md,
    ];

    pub fn parse(s: &str) -> Result<Self, ExportError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "html" | "htm" => Ok(ExportFormat::Html),
            "txt" | "text" => Ok(ExportFormat::Txt),
            "md" | "markdown" => Ok(ExportFormat::Md),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Html => "html",
            ExportFormat::Txt => "txt",
            ExportFormat::Md => "md",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Html => "text/html; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
            ExportFormat::Md => "text/markdown; charset=utf-8",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Docx => "Word (DOCX)",
            ExportFormat::Html => "HTML",
            ExportFormat::Txt => "Texto (TXT)",
            ExportFormat::Md => "Markdown",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Custom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// Portrait width and height in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Export knobs, read from the query string. Options that do not apply to
/// the chosen format are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub include_metadata: bool,
    pub theme: Theme,
    pub custom_color: String,
    /// DOCX body size in points.
    pub font_size: u32,
    pub include_toc: bool,
    pub include_styles: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            include_metadata: true,
            theme: Theme::Dark,
            custom_color: DEFAULT_CUSTOM_COLOR.to_string(),
            font_size: 12,
            include_toc: false,
            include_styles: true,
        }
    }
}

impl ExportOptions {
    /// Page width and height in millimetres after applying the orientation.
    pub fn page_mm(&self) -> (f32, f32) {
        let (w, h) = self.page_size.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Clamp the font size to something a word processor will accept.
    pub fn font_size(&self) -> u32 {
        self.font_size.clamp(6, 72)
    }
}

// ============================================================================
// Colours
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const DARK_BACKGROUND: Rgb = Rgb(0x1C, 0x1F, 0x23);
    pub const LIGHT_TEXT: Rgb = Rgb(0xe0, 0xe6, 0xeb);

    /// Parse `#RRGGBB`.
    pub fn parse_hex(hex: &str) -> Result<Rgb, ExportError> {
        let invalid = || ExportError::InvalidColor(hex.to_string());
        let digits = hex.trim().strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Perceived brightness in `0.0..=1.0`.
    pub fn luminance(&self) -> f64 {
        (0.299 * self.0 as f64 + 0.587 * self.1 as f64 + 0.114 * self.2 as f64) / 255.0
    }

    /// Readable text colour on this background.
    pub fn contrast(&self) -> Rgb {
        if self.luminance() > 0.5 {
            Rgb::BLACK
        } else {
            Rgb::LIGHT_TEXT
        }
    }

    /// Channels scaled to `0.0..=1.0`, as PDF colour operators expect.
    pub fn unit(&self) -> [f32; 3] {
        [self.0 as f32 / 255.0, self.1 as f32 / 255.0, self.2 as f32 / 255.0]
    }
}

/// Background and text colour for a theme, plus the secondary colours
/// derived from whether the text is black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb,
    pub text: Rgb,
}

impl Palette {
    pub fn for_theme(theme: Theme, custom_color: &str) -> Result<Palette, ExportError> {
        Ok(match theme {
            Theme::Light => Palette {
                background: Rgb::WHITE,
                text: Rgb::BLACK,
            },
            Theme::Dark => Palette {
                background: Rgb::DARK_BACKGROUND,
                text: Rgb::LIGHT_TEXT,
            },
            Theme::Custom => {
                let background = Rgb::parse_hex(custom_color)?;
                Palette {
                    background,
                    text: background.contrast(),
                }
            }
        })
    }

    fn dark_text(&self) -> bool {
        self.text == Rgb::BLACK
    }

    pub fn accent(&self) -> &'static str {
        if self.dark_text() { "#3498db" } else { "#74b9ff" }
    }

    pub fn muted(&self) -> &'static str {
        if self.dark_text() { "#666" } else { "#b0b0b0" }
    }

    pub fn rule(&self) -> &'static str {
        if self.dark_text() { "#ddd" } else { "#555" }
    }

    pub fn code_background(&self) -> &'static str {
        if self.dark_text() { "#f4f4f4" } else { "#2c3e50" }
    }

    pub fn code_text(&self) -> &'static str {
        if self.dark_text() { "#000" } else { "#e0e6eb" }
    }
}

// ============================================================================
// Output
// ============================================================================

/// A rendered download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    /// Set when a printable HTML page stands in for a PDF or DOCX.
    pub fallback: bool,
}

impl ExportFile {
    fn new(filename: String, content_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            filename,
            content_type,
            bytes,
            fallback: false,
        }
    }
}

/// Title used in exports; documents without a name export as "documento".
pub fn export_title(document: &Document) -> &str {
    let name = document.name.trim();
    if name.is_empty() { "documento" } else { name }
}

/// Replace every character outside `[A-Za-z0-9 ]` with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == ' ' { c } else { '_' })
        .collect()
}

/// Make a name safe for `Content-Disposition`.
pub fn safe_download_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub fn export_filename(title: &str, suffix: &str) -> String {
    safe_download_name(&format!("{}{}", sanitize_title(title), suffix))
}

/// Content for export; empty documents export a placeholder paragraph.
fn export_content(document: &Document) -> &str {
    if document.content.trim().is_empty() {
        "<p>Documento vazio</p>"
    } else {
        &document.content
    }
}

/// Render `document` as `format`.
///
/// Invalid options (an unparseable custom colour) are errors. PDF and DOCX
/// generation failures are not: they produce the printable HTML substitute
/// with `fallback` set.
pub fn export_document(
    document: &Document,
    format: ExportFormat,
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> Result<ExportFile, ExportError> {
    export_with(document, format, options, now, |title, content, palette| match format {
        ExportFormat::Docx => docx::render(title, content, options),
        _ => pdf::render(title, content, options, palette, now),
    })
}

/// [`export_document`] with the PDF/DOCX renderer supplied by the caller.
/// `render` is only called for those two formats.
pub(crate) fn export_with<R>(
    document: &Document,
    format: ExportFormat,
    options: &ExportOptions,
    now: DateTime<Utc>,
    render: R,
) -> Result<ExportFile, ExportError>
where
    R: FnOnce(&str, &str, &Palette) -> Result<Vec<u8>, ExportError>,
{
    let title = export_title(document);
    let content = export_content(document);
    let palette = Palette::for_theme(options.theme, &options.custom_color)?;
    let filename = export_filename(title, &format!(".{}", format.extension()));

    let file = match format {
        ExportFormat::Pdf | ExportFormat::Docx => match render(title, content, &palette) {
            Ok(bytes) => ExportFile::new(filename, format.content_type(), bytes),
            Err(e) => {
                tracing::warn!(
                    "{} export of {} failed, sending printable HTML: {}",
                    format,
                    document.id,
                    e
                );
                if format == ExportFormat::Pdf {
                    let page = html::printable_for_pdf(title, content, document.last_modified, options, &palette);
                    fallback_file(title, "_para_PDF.html", page)
                } else {
                    let page = html::printable_for_word(title, content, options);
                    fallback_file(title, "_para_Word.html", page)
                }
            }
        },
        ExportFormat::Html => {
            let page = html::standalone(title, content, &palette, options.include_styles, now);
            ExportFile::new(filename, format.content_type(), page.into_bytes())
        }
        ExportFormat::Txt => {
            let body = text::to_txt(title, content);
            ExportFile::new(filename, format.content_type(), body.into_bytes())
        }
        ExportFormat::Md => {
            let body = text::to_markdown(title, content);
            ExportFile::new(filename, format.content_type(), body.into_bytes())
        }
    };

    tracing::info!(
        "Exported {} as {} ({} bytes{})",
        document.id,
        format,
        file.bytes.len(),
        if file.fallback { ", printable fallback" } else { "" }
    );
    Ok(file)
}

fn fallback_file(title: &str, suffix: &str, page: String) -> ExportFile {
    ExportFile {
        filename: export_filename(title, suffix),
        content_type: ExportFormat::Html.content_type(),
        bytes: page.into_bytes(),
        fallback: true,
    }
}

// ============================================================================
// JSON
// ============================================================================

/// One document as pretty JSON, named `<name>_<YYYY-MM-DD>.json`.
pub fn document_json(document: &Document, now: DateTime<Utc>) -> Result<ExportFile, serde_json::Error> {
    let body = serde_json::to_vec_pretty(document)?;
    let filename = safe_download_name(&format!(
        "{}_{}.json",
        export_title(document),
        now.format("%Y-%m-%d")
    ));
    Ok(ExportFile::new(filename, "application/json", body))
}

/// Every stored record as a pretty JSON array.
pub fn backup_json(records: &[serde_json::Value]) -> Result<ExportFile, serde_json::Error> {
    let body = serde_json::to_vec_pretty(records)?;
    Ok(ExportFile::new(BACKUP_FILENAME.to_string(), "application/json", body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Document {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        Document {
            id: "doc-1".to_string(),
            name: "Relatório: Q1/2024".to_string(),
            content: "<h1>Resumo</h1><p>Tudo <strong>certo</strong>.</p><ul><li>um</li></ul>".to_string(),
            category: "Trabalho".to_string(),
            tags: vec!["a".to_string()],
            created: at,
            last_modified: at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("PDF").unwrap(), ExportFormat::Pdf);
        assert_eq!(ExportFormat::parse("markdown").unwrap(), ExportFormat::Md);
        assert!(matches!(
            ExportFormat::parse("odt"),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_filenames() {
        assert_eq!(sanitize_title("Relatório: Q1/2024"), "Relat_rio_ Q1_2024");
        assert_eq!(export_filename("Meu doc", ".pdf"), "Meu doc.pdf");
        assert_eq!(safe_download_name("a<b>:c\"d/e\\f|g?h*"), "a_b__c_d_e_f_g_h_");
    }

    #[test]
    fn test_palette() {
        let dark = Palette::for_theme(Theme::Dark, "").unwrap();
        assert_eq!(dark.background.to_hex(), "#1c1f23");
        assert_eq!(dark.text.to_hex(), "#e0e6eb");
        assert_eq!(dark.accent(), "#74b9ff");

        let light = Palette::for_theme(Theme::Light, "").unwrap();
        assert_eq!(light.text, Rgb::BLACK);
        assert_eq!(light.accent(), "#3498db");

        let pale = Palette::for_theme(Theme::Custom, "#F0F0A0").unwrap();
        assert_eq!(pale.text, Rgb::BLACK);
        let deep = Palette::for_theme(Theme::Custom, "#202060").unwrap();
        assert_eq!(deep.text, Rgb::LIGHT_TEXT);
    }

    #[test]
    fn test_invalid_custom_color() {
        for bad in ["red", "#12345", "#GGGGGG", "123456"] {
            assert!(matches!(
                Palette::for_theme(Theme::Custom, bad),
                Err(ExportError::InvalidColor(_))
            ));
        }
        // The colour is only checked when the custom theme is chosen.
        assert!(Palette::for_theme(Theme::Dark, "red").is_ok());
    }

    #[test]
    fn test_options_from_query() {
        let options: ExportOptions =
            serde_json::from_value(serde_json::json!({"pageSize": "letter", "orientation": "landscape", "fontSize": 14}))
                .unwrap();
        assert_eq!(options.page_size, PageSize::Letter);
        assert_eq!(options.page_mm(), (279.4, 215.9));
        assert_eq!(options.font_size(), 14);
        assert_eq!(options.theme, Theme::Dark);
        assert!(options.include_metadata);
    }

    #[test]
    fn test_export_text_formats() {
        let doc = sample();
        let txt = export_document(&doc, ExportFormat::Txt, &ExportOptions::default(), now()).unwrap();
        assert_eq!(txt.filename, "Relat_rio_ Q1_2024.txt");
        let body = String::from_utf8(txt.bytes).unwrap();
        assert!(body.starts_with("Relatório: Q1/2024\n==================\n\n"));

        let md = export_document(&doc, ExportFormat::Md, &ExportOptions::default(), now()).unwrap();
        let body = String::from_utf8(md.bytes).unwrap();
        assert!(body.starts_with("# Relatório: Q1/2024\n\n# Resumo"));
        assert!(body.contains("**certo**"));
    }

    #[test]
    fn test_export_binary_formats() {
        let doc = sample();
        let pdf = export_document(&doc, ExportFormat::Pdf, &ExportOptions::default(), now()).unwrap();
        assert!(!pdf.fallback);
        assert!(pdf.bytes.starts_with(b"%PDF-"));
        assert_eq!(pdf.content_type, "application/pdf");

        let docx = export_document(&doc, ExportFormat::Docx, &ExportOptions::default(), now()).unwrap();
        assert!(!docx.fallback);
        assert!(docx.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_fallback_file_name() {
        let file = fallback_file("Meu: doc", "_para_PDF.html", "<html></html>".to_string());
        assert_eq!(file.filename, "Meu_ doc_para_PDF.html");
        assert!(file.fallback);
        assert!(file.content_type.starts_with("text/html"));
    }

    #[test]
    fn test_failed_renders_fall_back_to_printable_html() {
        let doc = sample();
        let options = ExportOptions::default();

        let pdf = export_with(&doc, ExportFormat::Pdf, &options, now(), |_, _, _| {
            Err(ExportError::Pdf("font table missing".into()))
        })
        .unwrap();
        assert!(pdf.fallback);
        assert_eq!(pdf.filename, "Relat_rio_ Q1_2024_para_PDF.html");
        assert!(pdf.content_type.starts_with("text/html"));
        assert!(String::from_utf8(pdf.bytes).unwrap().contains("Resumo"));

        let docx = export_with(&doc, ExportFormat::Docx, &options, now(), |_, _, _| {
            Err(ExportError::Docx("zip writer closed".into()))
        })
        .unwrap();
        assert!(docx.fallback);
        assert_eq!(docx.filename, "Relat_rio_ Q1_2024_para_Word.html");
        assert!(docx.content_type.starts_with("text/html"));

        let ok = export_with(&doc, ExportFormat::Pdf, &options, now(), |_, _, _| Ok(b"%PDF-1.4".to_vec())).unwrap();
        assert!(!ok.fallback);
        assert_eq!(ok.filename, "Relat_rio_ Q1_2024.pdf");
    }

    #[test]
    fn test_render_errors_do_not_mask_bad_options() {
        let options = ExportOptions {
            theme: Theme::Custom,
            custom_color: "teal".to_string(),
            ..ExportOptions::default()
        };
        let result = export_with(&sample(), ExportFormat::Pdf, &options, now(), |_, _, _| {
            Err(ExportError::Pdf("unused".into()))
        });
        assert!(matches!(result, Err(ExportError::InvalidColor(_))));
    }

    #[test]
    fn test_json_exports() {
        let doc = sample();
        let file = document_json(&doc, now()).unwrap();
        assert_eq!(file.filename, "Relatório_ Q1_2024_2024-05-06.json");
        let value: serde_json::Value = serde_json::from_slice(&file.bytes).unwrap();
        assert_eq!(value["lastModified"], "2024-03-01T10:00:00.000Z");

        let backup = backup_json(&[value.clone(), value]).unwrap();
        assert_eq!(backup.filename, BACKUP_FILENAME);
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&backup.bytes).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_empty_document_exports_placeholder() {
        let mut doc = sample();
        doc.content = "  ".to_string();
        doc.name = String::new();
        let file = export_document(&doc, ExportFormat::Txt, &ExportOptions::default(), now()).unwrap();
        assert_eq!(file.filename, "documento.txt");
        assert!(String::from_utf8(file.bytes).unwrap().contains("Documento vazio"));
    }
}
