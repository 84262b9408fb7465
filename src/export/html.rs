//! Standalone HTML exports: the themed page and the printable substitutes
//! sent when PDF or DOCX generation fails.

use chrono::{DateTime, Utc};

use super::{ExportOptions, Palette};
use crate::html::{html_escape, sanitize};

/// Shared body of every exported page: title, sanitised content and the
/// optional export header and footer.
pub fn standalone(
    title: &str,
    content: &str,
    palette: &Palette,
    include_styles: bool,
    exported_at: DateTime<Utc>,
) -> String {
    let title = html_escape(title);
    let date = exported_at.format("%d/%m/%Y");
    let time = exported_at.format("%H:%M:%S");
    let styles = if include_styles {
        format!("\n    <style>{}{}\n    </style>", BASE_STYLES, theme_styles(palette))
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>{styles}
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        <p class="exported">Exportado do Docs em {date} às {time}</p>
    </div>
    <div class="content">
        {content}
    </div>
    <div class="footer">
        <p>Este documento foi criado usando Docs, um editor de documentos privado.</p>
        <p>Data de exportação: {date} às {time}</p>
    </div>
</body>
</html>"#,
        title = title,
        styles = styles,
        date = date,
        time = time,
        content = sanitize(content),
    )
}

const BASE_STYLES: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 2rem; }
        h1, h2, h3, h4, h5, h6 { margin-top: 2rem; margin-bottom: 1rem; }
        h1 { font-size: 2.5rem; }
        h2 { font-size: 2rem; }
        h3 { font-size: 1.75rem; }
        p { margin-bottom: 1rem; }
        a { text-decoration: none; }
        a:hover { text-decoration: underline; }
        blockquote { padding-left: 1rem; margin-left: 0; }
        code { padding: 2px 4px; border-radius: 3px; font-family: 'Courier New', monospace; }
        pre { padding: 1rem; border-radius: 4px; overflow-x: auto; font-family: 'Courier New', monospace; }
        li { margin-bottom: 0.5rem; }
        hr { border: none; margin: 2rem 0; }
        .header { padding-bottom: 1rem; margin-bottom: 2rem; }
        .exported { font-style: italic; }
        .footer { padding-top: 1rem; margin-top: 2rem; font-size: 0.9em; }"#;

fn theme_styles(palette: &Palette) -> String {
    let text = palette.text.to_hex();
    format!(
        r#"
        body {{ background-color: {bg}; color: {text}; }}
        h1, h2, h3, h4, h5, h6 {{ color: {text}; }}
        a {{ color: {accent}; }}
        blockquote {{ border-left: 4px solid {accent}; color: {muted}; }}
        code, pre {{ background: {code_bg}; color: {code_text}; }}
        hr {{ border-top: 1px solid {rule}; }}
        .header {{ border-bottom: 2px solid {accent}; }}
        .exported, .footer {{ color: {muted}; }}
        .footer {{ border-top: 1px solid {rule}; }}"#,
        bg = palette.background.to_hex(),
        text = text,
        accent = palette.accent(),
        muted = palette.muted(),
        code_bg = palette.code_background(),
        code_text = palette.code_text(),
        rule = palette.rule(),
    )
}

/// Print-ready page standing in for a PDF: themed colours that survive
/// printing, plus a notice explaining how to save it as PDF.
pub fn printable_for_pdf(
    title: &str,
    content: &str,
    last_modified: DateTime<Utc>,
    options: &ExportOptions,
    palette: &Palette,
) -> String {
    let title = html_escape(title);
    let header = if options.include_metadata {
        format!(
            r#"<div class="pdf-header">
        <h1>{}</h1>
        <p class="exported">Exportado em {}</p>
    </div>"#,
            title,
            last_modified.format("%d/%m/%Y")
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        @media print {{
            body {{ -webkit-print-color-adjust: exact; print-color-adjust: exact; }}
            .export-notice {{ display: none; }}
        }}
        body {{ background-color: {bg} !important; color: {text} !important; font-family: 'Times New Roman', serif; line-height: 1.6; margin: 0; padding: 2cm; }}
        h1, h2, h3, h4, h5, h6 {{ color: {text} !important; page-break-after: avoid; }}
        p {{ page-break-inside: avoid; orphans: 3; widows: 3; }}
        .pdf-header {{ text-align: center; border-bottom: 2px solid {accent}; padding-bottom: 1rem; margin-bottom: 2rem; }}
        .exported {{ color: {muted}; font-style: italic; }}
        .export-notice {{ border: 1px dashed {accent}; padding: 0.75rem; margin-bottom: 1.5rem; }}
    </style>
</head>
<body>
    <div class="export-notice">Não foi possível gerar o PDF diretamente. Use Ctrl+P neste arquivo e escolha "Salvar como PDF".</div>
    {header}
    {content}
</body>
</html>"#,
        title = title,
        bg = palette.background.to_hex(),
        text = palette.text.to_hex(),
        accent = palette.accent(),
        muted = palette.muted(),
        header = header,
        content = sanitize(content),
    )
}

/// Page standing in for a DOCX, meant to be opened in Word and saved again.
pub fn printable_for_word(title: &str, content: &str, options: &ExportOptions) -> String {
    let title = html_escape(title);
    let toc = if options.include_toc {
        r#"<div style="page-break-after: always;">
        <h2 style="text-align: center;">Sumário</h2>
        <p style="font-style: italic; color: #666;">O sumário será gerado automaticamente pelo Word com base nos títulos do documento.</p>
    </div>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{ font-family: 'Times New Roman', serif; font-size: {size}pt; line-height: 1.6; color: #000; background: white; margin: 2.5cm; }}
        h1 {{ text-align: center; margin-bottom: 2rem; }}
        h1, h2, h3, h4, h5, h6 {{ color: #333; page-break-after: avoid; }}
        p {{ text-align: justify; page-break-inside: avoid; orphans: 3; widows: 3; }}
        .export-notice {{ border: 1px dashed #999; padding: 0.75rem; margin-bottom: 1.5rem; }}
        @media print {{ .export-notice {{ display: none; }} }}
    </style>
</head>
<body>
    <div class="export-notice">Não foi possível gerar o arquivo Word diretamente. Abra este arquivo no Microsoft Word e salve como .docx.</div>
    <h1>{title}</h1>
    {toc}
    {content}
</body>
</html>"#,
        title = title,
        size = options.font_size(),
        toc = toc,
        content = sanitize(content),
    )
}
