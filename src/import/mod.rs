//! File import: type detection, validation, processor dispatch.
//!
//! Every supported format has a [`Processor`] that turns raw bytes into
//! sanitised editor HTML plus a bag of metadata. The dispatcher here picks
//! the processor from the upload's MIME type or extension, then settles on a
//! document title.

pub mod html;
pub mod markdown;
pub mod pdf;
pub mod rtf;
pub mod text;
pub mod word;

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ImportError;
use crate::html::{collapse_spaces, find_first, parse_fragment};

pub type Metadata = Map<String, Value>;

// ============================================================================
// File Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Doc,
    Html,
    Txt,
    Md,
    Rtf,
}

impl FileKind {
    pub const ALL: [FileKind; 7] = [
        FileKind::Pdf,
        FileKind::Docx,
        FileKind::Doc,
        FileKind::Html,
        FileKind::Txt,
        FileKind::Md,
        FileKind::Rtf,
    ];

    pub fn from_mime(mime: &str) -> Option<FileKind> {
        let mime = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" => Some(FileKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(FileKind::Docx)
            }
            "application/msword" => Some(FileKind::Doc),
            "text/html" => Some(FileKind::Html),
            "text/plain" => Some(FileKind::Txt),
            "text/markdown" | "text/x-markdown" => Some(FileKind::Md),
            "application/rtf" | "text/rtf" => Some(FileKind::Rtf),
            _ => None,
        }
    }

    pub fn from_extension(filename: &str) -> Option<FileKind> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "doc" => Some(FileKind::Doc),
            "html" | "htm" => Some(FileKind::Html),
            "txt" => Some(FileKind::Txt),
            "md" | "markdown" => Some(FileKind::Md),
            "rtf" => Some(FileKind::Rtf),
            _ => None,
        }
    }

    /// MIME type wins over the extension when both resolve.
    pub fn detect(mime: Option<&str>, filename: &str) -> Option<FileKind> {
        mime.and_then(FileKind::from_mime)
            .or_else(|| FileKind::from_extension(filename))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Doc => "doc",
            FileKind::Html => "html",
            FileKind::Txt => "txt",
            FileKind::Md => "md",
            FileKind::Rtf => "rtf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            FileKind::Doc => "application/msword",
            FileKind::Html => "text/html",
            FileKind::Txt => "text/plain",
            FileKind::Md => "text/markdown",
            FileKind::Rtf => "application/rtf",
        }
    }

    /// Human label and accepted extensions, for the import page.
    pub fn description(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            FileKind::Pdf => ("Documentos PDF", &[".pdf"]),
            FileKind::Docx | FileKind::Doc => ("Documentos Microsoft Word", &[".docx", ".doc"]),
            FileKind::Html => ("Páginas HTML", &[".html", ".htm"]),
            FileKind::Txt => ("Arquivos de texto simples", &[".txt"]),
            FileKind::Md => ("Arquivos Markdown", &[".md", ".markdown"]),
            FileKind::Rtf => ("Rich Text Format", &[".rtf"]),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

// ============================================================================
// Options and Results
// ============================================================================

/// Per-import knobs. Every flag defaults to on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportOptions {
    /// Plain text: split into paragraphs on blank lines. Off joins lines with `<br>`.
    pub preserve_line_breaks: bool,
    /// PDF: head each page with "Página N".
    pub preserve_pages: bool,
    /// PDF: stop after this many pages.
    pub max_pages: Option<usize>,
    /// Markdown: open external links in a new tab.
    pub process_external_links: bool,
    /// HTML: keep only the `<body>` content.
    pub extract_body_only: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            preserve_line_breaks: true,
            preserve_pages: true,
            max_pages: None,
            process_external_links: true,
            extract_body_only: true,
        }
    }
}

impl ImportOptions {
    /// Build options from loose form fields (multipart text parts).
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let flag = |name: &str, default: bool| {
            fields
                .get(name)
                .map(|v| !matches!(v.trim(), "false" | "0" | "off"))
                .unwrap_or(default)
        };
        Self {
            preserve_line_breaks: flag("preserveLineBreaks", true),
            preserve_pages: flag("preservePages", true),
            max_pages: fields
                .get("maxPages")
                .and_then(|v| v.trim().parse().ok())
                .filter(|&n: &usize| n > 0),
            process_external_links: flag("processExternalLinks", true),
            extract_body_only: flag("extractBodyOnly", true),
        }
    }
}

/// A file as it arrived in the upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Output of a single processor.
#[derive(Debug, Clone, Default)]
pub struct Processed {
    pub content: String,
    pub title: Option<String>,
    pub metadata: Metadata,
}

/// A successfully processed upload, before it becomes a document. The file
/// name lives on the surrounding [`ImportResult`].
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub size: u64,
    pub content: String,
    pub metadata: Metadata,
    pub title: String,
}

/// What the import endpoints report for each file.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub filename: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub file: Option<ProcessedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Id of the stored document, once confirmed.
    #[serde(rename = "documentId", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl ImportResult {
    pub fn failed(filename: &str, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            filename: filename.to_string(),
            file: None,
            error: Some(error.to_string()),
            document_id: None,
        }
    }
}

// ============================================================================
// Processors
// ============================================================================

pub trait Processor: Send + Sync {
    /// Parse raw bytes into editor HTML. Errors are plain messages; the
    /// dispatcher wraps them with the file kind.
    fn process(&self, bytes: &[u8], options: &ImportOptions) -> Result<Processed, String>;
}

static PDF: pdf::PdfProcessor = pdf::PdfProcessor;
static WORD: word::WordProcessor = word::WordProcessor;
static HTML: html::HtmlProcessor = html::HtmlProcessor;
static TEXT: text::TextProcessor = text::TextProcessor;
static MARKDOWN: markdown::MarkdownProcessor = markdown::MarkdownProcessor;
static RTF: rtf::RtfProcessor = rtf::RtfProcessor;

pub fn processor_for(kind: FileKind) -> &'static dyn Processor {
    match kind {
        FileKind::Pdf => &PDF,
        FileKind::Docx | FileKind::Doc => &WORD,
        FileKind::Html => &HTML,
        FileKind::Txt => &TEXT,
        FileKind::Md => &MARKDOWN,
        FileKind::Rtf => &RTF,
    }
}

// ============================================================================
// Validation
// ============================================================================

pub const NO_FILE_SELECTED: &str = "Nenhum arquivo selecionado";

/// Check an upload before processing. All problems are reported at once.
pub fn validate_file(upload: Option<&Upload>, max_bytes: u64) -> Result<FileKind, ImportError> {
    let upload = match upload {
        Some(u) => u,
        None => {
            return Err(ImportError::Validation(vec![NO_FILE_SELECTED.to_string()]))
        }
    };

    let mut errors = Vec::new();
    let kind = FileKind::detect(upload.mime.as_deref(), &upload.filename);
    if kind.is_none() {
        let declared = upload
            .mime
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("desconhecido");
        errors.push(format!("Tipo de arquivo não suportado: {}", declared));
    }

    let size = upload.bytes.len() as u64;
    if size > max_bytes {
        errors.push(format!(
            "Arquivo muito grande. Tamanho máximo: {}",
            format_file_size(max_bytes)
        ));
    }
    if size == 0 {
        errors.push("Arquivo está vazio".to_string());
    }

    match kind {
        Some(kind) if errors.is_empty() => Ok(kind),
        _ => Err(ImportError::Validation(errors)),
    }
}

/// Human-readable size with one decimal: `10.0 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

// ============================================================================
// Dispatch
// ============================================================================

/// Validate and process one upload. Processor failures come back as an
/// unsuccessful [`ImportResult`]; only validation failures are errors.
pub fn process_file(
    upload: &Upload,
    options: &ImportOptions,
    max_bytes: u64,
) -> Result<ImportResult, ImportError> {
    let kind = validate_file(Some(upload), max_bytes)?;
    tracing::info!(
        "Processing {} ({}, {} bytes)",
        upload.filename,
        kind,
        upload.bytes.len()
    );

    // Parser crates can panic on malformed input; treat that as a failed import.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        processor_for(kind).process(&upload.bytes, options)
    }))
    .unwrap_or_else(|_| Err("Arquivo corrompido ou em formato não suportado".to_string()));

    let processed = match outcome {
        Ok(p) => p,
        Err(message) => {
            let err = ImportError::processor(kind, message);
            tracing::warn!("Import of {} failed: {}", upload.filename, err);
            return Ok(ImportResult::failed(&upload.filename, err));
        }
    };

    let stem = file_stem(&upload.filename);
    let title = resolve_title(processed.title.as_deref(), &stem, &processed.content);

    let mut metadata = processed.metadata;
    metadata.insert("characters".into(), processed.content.chars().count().into());
    metadata.insert("words".into(), processed.content.split_whitespace().count().into());
    metadata.insert("paragraphs".into(), count_paragraph_tags(&processed.content).into());

    Ok(ImportResult {
        success: true,
        filename: upload.filename.clone(),
        file: Some(ProcessedFile {
            kind,
            size: upload.bytes.len() as u64,
            content: processed.content,
            metadata,
            title,
        }),
        error: None,
        document_id: None,
    })
}

/// File name without its last extension.
pub fn file_stem(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

/// Opening `<p>` tags (not `<pre>` or `<param>`).
fn count_paragraph_tags(html: &str) -> usize {
    let lower = html.to_ascii_lowercase();
    lower
        .match_indices("<p")
        .filter(|(i, _)| {
            lower[i + 2..]
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c.is_whitespace())
        })
        .count()
}

// ============================================================================
// Title Resolution
// ============================================================================

const GENERIC_TITLES: &[&str] = &["documento", "Documento HTML"];

/// Pick the document title: the processor's unless it is missing, generic
/// or just the file name; then something from the content; then a label
/// built from the file name.
pub fn resolve_title(processor_title: Option<&str>, stem: &str, content: &str) -> String {
    let candidate = processor_title
        .map(str::trim)
        .filter(|t| !t.is_empty() && !GENERIC_TITLES.contains(t) && *t != stem);
    if let Some(title) = candidate {
        return title.to_string();
    }
    title_from_content(content).unwrap_or_else(|| format!("Documento Importado - {}", stem))
}

/// First usable h1/h2/h3, else the first words of the first paragraph.
pub fn title_from_content(content: &str) -> Option<String> {
    let nodes = parse_fragment(content);

    for tag in ["h1", "h2", "h3"] {
        if let Some(heading) = find_first(&nodes, tag) {
            let title = collapse_spaces(&heading.text());
            let len = title.chars().count();
            let lower = title.to_lowercase();
            if len > 2 && len < 100 && !lower.contains("documento") && !lower.contains("untitled") {
                return Some(title);
            }
        }
    }

    let paragraph = find_first(&nodes, "p")?;
    let text = collapse_spaces(&paragraph.text());
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let head = words[..words.len().min(5)].join(" ");
    if head.chars().count() < 50 {
        let more = if words.len() > 5 { "..." } else { "" };
        Some(format!("{}{}", head, more))
    } else {
        None
    }
}

/// Truncate to `max` characters, appending `...` when cut.
pub(crate) fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Decode upload bytes as UTF-8, dropping a BOM and replacing bad sequences.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: Option<&str>, bytes: &[u8]) -> Upload {
        Upload {
            filename: name.to_string(),
            mime: mime.map(String::from),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_canonical_mime_maps_back() {
        for kind in FileKind::ALL {
            assert_eq!(FileKind::from_mime(kind.mime_type()), Some(kind));
        }
    }

    #[test]
    fn test_detect_mime_wins() {
        assert_eq!(FileKind::detect(Some("text/markdown"), "notes.txt"), Some(FileKind::Md));
        assert_eq!(FileKind::detect(Some("application/octet-stream"), "a.HTM"), Some(FileKind::Html));
        assert_eq!(FileKind::detect(None, "a.markdown"), Some(FileKind::Md));
        assert_eq!(FileKind::detect(Some("text/plain; charset=utf-8"), "x"), Some(FileKind::Txt));
        assert_eq!(FileKind::detect(Some("image/png"), "a.png"), None);
        assert_eq!(FileKind::detect(None, "README"), None);
    }

    #[test]
    fn test_display_is_uppercase() {
        assert_eq!(FileKind::Docx.to_string(), "DOCX");
        assert_eq!(serde_json::to_value(FileKind::Md).unwrap(), "md");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let file = upload("image.png", Some("image/png"), &[]);
        let err = validate_file(Some(&file), 10).unwrap_err();
        let ImportError::Validation(errors) = err else { panic!("expected validation error") };
        assert_eq!(
            errors,
            vec![
                "Tipo de arquivo não suportado: image/png".to_string(),
                "Arquivo está vazio".to_string(),
            ]
        );
    }

    #[test]
    fn test_validate_size_cap() {
        let file = upload("big.txt", None, &vec![b'a'; 2048]);
        let err = validate_file(Some(&file), 1024).unwrap_err();
        assert_eq!(err.to_string(), "Arquivo muito grande. Tamanho máximo: 1.0 KB");

        let ok = upload("small.txt", None, b"hi");
        assert_eq!(validate_file(Some(&ok), 1024).unwrap(), FileKind::Txt);
    }

    #[test]
    fn test_validate_missing_file() {
        let err = validate_file(None, 10).unwrap_err();
        assert_eq!(err.to_string(), "Nenhum arquivo selecionado");
    }

    #[test]
    fn test_process_text_file() {
        let file = upload("notes.txt", Some("text/plain"), b"RELATORIO\n\nPrimeiro paragrafo aqui.");
        let result = process_file(&file, &ImportOptions::default(), 1024).unwrap();
        assert!(result.success);
        let processed = result.file.unwrap();
        assert_eq!(processed.kind, FileKind::Txt);
        assert_eq!(processed.title, "RELATORIO");
        assert_eq!(processed.metadata["paragraphs"], 1);
        assert!(processed.metadata.contains_key("characters"));
    }

    #[test]
    fn test_processor_failure_is_unsuccessful_result() {
        let file = upload("old.doc", Some("application/msword"), b"\xD0\xCF\x11\xE0 not a zip");
        let result = process_file(&file, &ImportOptions::default(), 1024).unwrap();
        assert!(!result.success);
        assert_eq!(result.filename, "old.doc");
        assert!(result.error.unwrap().starts_with("Erro ao processar arquivo DOC:"));

        let json = serde_json::to_value(ImportResult::failed("x.pdf", "boom")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "filename": "x.pdf", "error": "boom"}));
    }

    #[test]
    fn test_resolve_title() {
        assert_eq!(resolve_title(Some("Relatório"), "file", "<h1>Other</h1>"), "Relatório");
        assert_eq!(resolve_title(Some("file"), "file", "<h1>Heading Title</h1>"), "Heading Title");
        assert_eq!(resolve_title(Some("Documento HTML"), "page", "<h2>Real</h2>"), "Real");
        assert_eq!(
            resolve_title(None, "page", "<h1>Documento sem nome</h1><p>um dois tres quatro cinco seis</p>"),
            "um dois tres quatro cinco..."
        );
        assert_eq!(resolve_title(None, "page", "<div></div>"), "Documento Importado - page");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("a.b.txt"), "a.b");
        assert_eq!(file_stem("README"), "README");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_options_from_fields() {
        let mut fields = HashMap::new();
        fields.insert("preservePages".to_string(), "false".to_string());
        fields.insert("maxPages".to_string(), "3".to_string());
        let options = ImportOptions::from_fields(&fields);
        assert!(!options.preserve_pages);
        assert!(options.preserve_line_breaks);
        assert_eq!(options.max_pages, Some(3));
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("ação", 2), "aç...");
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
    }
}
