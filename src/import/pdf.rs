//! PDF import.
//!
//! Text comes from `pdf_extract`, page by page. PDFs carry no paragraph
//! structure, so sentences are regrouped into paragraphs by length and by a
//! few cues (numbered lines, `Label:` prefixes, concluding connectives).
//! Document info (title, author, ...) is read with `lopdf`.

use std::panic::{self, AssertUnwindSafe};

use lopdf::Object;
use regex::Regex;
use serde_json::json;

use super::{ImportOptions, Metadata, Processed, Processor};
use crate::html::{collapse_spaces, html_escape};

/// Paragraphs are flushed once they grow past this many characters.
const PARAGRAPH_CHARS: usize = 200;

const CONCLUDING_WORDS: &[&str] = &["portanto", "assim", "enfim", "concluindo"];

pub struct PdfProcessor;

impl Processor for PdfProcessor {
    fn process(&self, bytes: &[u8], options: &ImportOptions) -> Result<Processed, String> {
        // pdf_extract panics on some malformed files instead of returning errors.
        let pages = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }))
        .map_err(|_| "PDF corrompido ou em formato não suportado".to_string())?
        .map_err(|e| format!("Falha ao extrair texto: {}", e))?;

        let total_pages = pages.len();
        let limit = options.max_pages.unwrap_or(total_pages).min(total_pages);

        let splitter = SentenceSplitter::new()?;
        let mut html = Vec::new();
        for (index, page) in pages.iter().take(limit).enumerate() {
            let paragraphs = splitter.paragraphs(page);
            if paragraphs.is_empty() {
                continue;
            }
            if options.preserve_pages {
                html.push(format!("<h3>Página {}</h3>", index + 1));
            }
            html.extend(paragraphs.iter().map(|p| format!("<p>{}</p>", html_escape(p))));
        }

        let content = if html.is_empty() {
            "<p>Não foi possível extrair texto do PDF</p>".to_string()
        } else {
            html.join("\n")
        };

        let mut metadata = document_info(bytes);
        metadata.insert("originalFormat".into(), json!("application/pdf"));
        metadata.insert("pages".into(), json!(total_pages));
        metadata.insert("pagesProcessed".into(), json!(limit));

        let title = metadata
            .get("title")
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(Processed {
            content,
            title,
            metadata,
        })
    }
}

// ============================================================================
// Paragraph Reconstruction
// ============================================================================

struct SentenceSplitter {
    boundary: Regex,
    label: Regex,
    numbered: Regex,
}

impl SentenceSplitter {
    fn new() -> Result<Self, String> {
        let compile = |pattern: &str| Regex::new(pattern).map_err(|e| e.to_string());
        Ok(Self {
            boundary: compile(r"[.!?]+\s+")?,
            label: compile(r"^\w+:")?,
            numbered: compile(r"\d+\.$")?,
        })
    }

    /// Sentences with their closing punctuation kept.
    fn sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.boundary.find_iter(text) {
            let sentence = text[start..m.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = m.end();
        }
        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
        sentences
    }

    fn ends_paragraph(&self, sentence: &str) -> bool {
        let lower = sentence.to_lowercase();
        self.numbered.is_match(sentence)
            || self.label.is_match(sentence)
            || lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|w| CONCLUDING_WORDS.contains(&w))
    }

    fn paragraphs(&self, page_text: &str) -> Vec<String> {
        let normalized = collapse_spaces(page_text);
        let mut paragraphs = Vec::new();
        let mut current = String::new();

        for sentence in self.sentences(&normalized) {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&sentence);
            if current.chars().count() > PARAGRAPH_CHARS || self.ends_paragraph(&sentence) {
                paragraphs.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            paragraphs.push(current);
        }
        paragraphs
    }
}

// ============================================================================
// Document Info
// ============================================================================

fn document_info(bytes: &[u8]) -> Metadata {
    let mut metadata = Metadata::new();
    let Ok(doc) = lopdf::Document::load_mem(bytes) else {
        return metadata;
    };
    metadata.insert("version".into(), json!(doc.version));

    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let Some(info) = info else {
        return metadata;
    };

    let fields = [
        ("Title", "title"),
        ("Author", "author"),
        ("Subject", "subject"),
        ("Keywords", "keywords"),
        ("Creator", "creator"),
        ("Producer", "producer"),
        ("CreationDate", "creationDate"),
        ("ModDate", "modificationDate"),
    ];
    for (name, key) in fields {
        if let Ok(Object::String(raw, _)) = info.get(name.as_bytes()) {
            let value = decode_pdf_string(raw);
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let value = if key.ends_with("Date") {
                pdf_date(value).unwrap_or_else(|| value.to_string())
            } else {
                value.to_string()
            };
            metadata.insert(key.into(), json!(value));
        }
    }
    metadata
}

/// Text strings are UTF-16BE when they start with a byte order mark,
/// otherwise single-byte.
fn decode_pdf_string(raw: &[u8]) -> String {
    match raw.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => raw.iter().map(|&b| b as char).collect(),
    }
}

/// `D:YYYYMMDD...` to `YYYY-MM-DD`.
fn pdf_date(value: &str) -> Option<String> {
    let digits = value.strip_prefix("D:").unwrap_or(value);
    let date = digits.get(..8)?;
    if !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..8]))
}
