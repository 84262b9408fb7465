//! RTF import.
//!
//! A single pass over the control words keeps visible text and drops
//! destination groups (font tables, colour tables, pictures, info). `\par`
//! ends a paragraph and `\line` is a soft break.

use regex::Regex;
use serde_json::json;

use super::{truncate_with_ellipsis, ImportOptions, Metadata, Processed, Processor};
use crate::html::html_escape;

pub struct RtfProcessor;

impl Processor for RtfProcessor {
    fn process(&self, bytes: &[u8], options: &ImportOptions) -> Result<Processed, String> {
        // RTF is 7-bit; anything else is treated as Latin-1.
        let source: String = bytes.iter().map(|&b| b as char).collect();
        if !source.trim_start().starts_with("{\\rtf") {
            return Err("Arquivo não é um documento RTF válido".to_string());
        }

        let text = rtf_to_text(&source);
        let mut metadata = extract_metadata(&source)?;
        metadata.insert("characters".into(), json!(text.trim().chars().count()));
        metadata.insert("words".into(), json!(text.split_whitespace().count()));

        let title = metadata
            .get("title")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| {
                text.lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(|l| truncate_with_ellipsis(l, 50))
            });

        Ok(Processed {
            content: text_to_html(&text, options.preserve_line_breaks),
            title,
            metadata,
        })
    }
}

// ============================================================================
// Scanner
// ============================================================================

/// Groups whose content is never visible text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl", "colortbl", "stylesheet", "info", "pict", "header", "footer", "headerl", "headerr",
    "footerl", "footerr", "listtable", "listoverridetable", "rsidtbl", "generator", "xmlnstbl",
    "themedata", "datastore", "latentstyles", "object", "fldinst",
];

struct Group {
    skip: bool,
    /// Characters still to drop after a `\uN` escape.
    uc: usize,
}

/// Visible text, with paragraphs separated by blank lines.
pub fn rtf_to_text(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::new();
    let mut stack: Vec<Group> = Vec::new();
    let mut skip = false;
    let mut uc = 1;
    let mut pending_skip = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => {
                stack.push(Group { skip, uc });
                i += 1;
                // `{\*\dest ...}` marks an optional destination.
                if chars.get(i) == Some(&'\\') && chars.get(i + 1) == Some(&'*') {
                    skip = true;
                    i += 2;
                }
            }
            '}' => {
                if let Some(group) = stack.pop() {
                    skip = group.skip;
                    uc = group.uc;
                }
                i += 1;
            }
            '\\' => {
                let next = chars.get(i + 1).copied();
                match next {
                    Some('\\') | Some('{') | Some('}') => {
                        if !skip {
                            emit(&mut out, next.unwrap_or_default(), &mut pending_skip);
                        }
                        i += 2;
                    }
                    Some('\'') => {
                        let hex: String = chars.iter().skip(i + 2).take(2).collect();
                        if let Ok(code) = u8::from_str_radix(&hex, 16) {
                            if !skip {
                                emit(&mut out, code as char, &mut pending_skip);
                            }
                        }
                        i += 4;
                    }
                    Some('~') => {
                        if !skip {
                            emit(&mut out, '\u{a0}', &mut pending_skip);
                        }
                        i += 2;
                    }
                    Some(ch) if ch.is_ascii_alphabetic() => {
                        let (word, param, after) = read_control_word(&chars, i + 1);
                        i = after;
                        if SKIPPED_DESTINATIONS.contains(&word.as_str()) {
                            skip = true;
                            continue;
                        }
                        if skip {
                            continue;
                        }
                        match word.as_str() {
                            "par" | "sect" | "page" => out.push_str("\n\n"),
                            "line" => out.push('\n'),
                            "tab" => out.push('\t'),
                            "emdash" => out.push('—'),
                            "endash" => out.push('–'),
                            "bullet" => out.push('•'),
                            "lquote" => out.push('‘'),
                            "rquote" => out.push('’'),
                            "ldblquote" => out.push('“'),
                            "rdblquote" => out.push('”'),
                            "uc" => uc = param.unwrap_or(1).max(0) as usize,
                            "u" => {
                                if let Some(value) = param {
                                    // Negative values wrap into the upper half of the BMP.
                                    let code = if value < 0 { value + 65536 } else { value };
                                    if let Some(ch) = char::from_u32(code as u32) {
                                        out.push(ch);
                                    }
                                    pending_skip = uc;
                                }
                            }
                            _ => {}
                        }
                    }
                    Some(_) => i += 2,
                    None => i += 1,
                }
            }
            '\r' | '\n' => i += 1,
            _ => {
                if !skip {
                    emit(&mut out, c, &mut pending_skip);
                }
                i += 1;
            }
        }
    }
    out
}

fn emit(out: &mut String, c: char, pending_skip: &mut usize) {
    if *pending_skip > 0 {
        *pending_skip -= 1;
        return;
    }
    out.push(c);
}

/// Control word name, optional signed numeric parameter, and the index after
/// the (optional) delimiting space.
fn read_control_word(chars: &[char], start: usize) -> (String, Option<i32>, usize) {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_alphabetic() {
        i += 1;
    }
    let word: String = chars[start..i].iter().collect();

    let num_start = i;
    if i < chars.len() && chars[i] == '-' {
        i += 1;
    }
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let param = if i > num_start {
        chars[num_start..i].iter().collect::<String>().parse().ok()
    } else {
        None
    };

    if i < chars.len() && chars[i] == ' ' {
        i += 1;
    }
    (word, param, i)
}

fn text_to_html(text: &str, preserve_line_breaks: bool) -> String {
    let paragraphs: Vec<String> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let escaped = html_escape(p);
            if preserve_line_breaks {
                escaped.replace('\n', "<br>")
            } else {
                escaped.replace('\n', " ")
            }
        })
        .map(|p| format!("<p>{}</p>", p))
        .collect();

    if paragraphs.is_empty() {
        "<p>Documento RTF vazio</p>".to_string()
    } else {
        paragraphs.join("\n")
    }
}

// ============================================================================
// Metadata
// ============================================================================

fn extract_metadata(source: &str) -> Result<Metadata, String> {
    let mut metadata = Metadata::new();
    metadata.insert("originalFormat".into(), json!("application/rtf"));

    for (field, key) in [("title", "title"), ("author", "author"), ("subject", "subject")] {
        let re = Regex::new(&format!(r"\{{\\{}\s+([^}}]*)\}}", field)).map_err(|e| e.to_string())?;
        if let Some(caps) = re.captures(source) {
            let value = rtf_to_text(&caps[1]).trim().to_string();
            if !value.is_empty() {
                metadata.insert(key.into(), json!(value));
            }
        }
    }

    let created = Regex::new(r"\\creatim\\yr(\d+)\\mo(\d+)\\dy(\d+)").map_err(|e| e.to_string())?;
    if let Some(caps) = created.captures(source) {
        let parts: Vec<u32> = (1..=3).filter_map(|i| caps[i].parse().ok()).collect();
        if let [year, month, day] = parts[..] {
            metadata.insert(
                "creationDate".into(),
                json!(format!("{:04}-{:02}-{:02}", year, month, day)),
            );
        }
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"{\rtf1\ansi\deff0{\fonttbl{\f0 Times New Roman;}}{\colortbl;\red0\green0\blue0;}
{\info{\title Relat\'f3rio Anual}{\author Ana}{\creatim\yr2023\mo4\dy7}}
{\*\generator Writer;}\f0\fs24 Primeira linha\line segunda\par
Ol\'e1 mundo \{chaves\} \\ barra\par
Unicode \u8364?euro\par}";

    #[test]
    fn test_visible_text() {
        let text = rtf_to_text(SAMPLE);
        assert!(!text.contains("Times"));
        assert!(!text.contains("Writer"));
        assert!(!text.contains("Ana"));
        assert!(text.contains("Primeira linha\nsegunda"));
        assert!(text.contains("Olá mundo {chaves} \\ barra"));
        assert!(text.contains("Unicode €euro"));
    }

    #[test]
    fn test_process() {
        let processed = RtfProcessor.process(SAMPLE.as_bytes(), &ImportOptions::default()).unwrap();
        assert_eq!(processed.title.as_deref(), Some("Relatório Anual"));
        assert_eq!(processed.metadata["author"], "Ana");
        assert_eq!(processed.metadata["creationDate"], "2023-04-07");
        assert!(processed.content.starts_with("<p>Primeira linha<br>segunda</p>"));
        assert!(processed.content.contains("<p>Olá mundo {chaves} \\ barra</p>"));
    }

    #[test]
    fn test_escapes_markup_in_text() {
        let processed = RtfProcessor
            .process(br"{\rtf1 a <b> & c\par}", &ImportOptions::default())
            .unwrap();
        assert_eq!(processed.content, "<p>a &lt;b&gt; &amp; c</p>");
        assert_eq!(processed.title.as_deref(), Some("a <b> & c"));
    }

    #[test]
    fn test_empty_document() {
        let processed = RtfProcessor.process(br"{\rtf1\ansi }", &ImportOptions::default()).unwrap();
        assert_eq!(processed.content, "<p>Documento RTF vazio</p>");
    }

    #[test]
    fn test_rejects_non_rtf() {
        assert!(RtfProcessor.process(b"plain text", &ImportOptions::default()).is_err());
    }
}
