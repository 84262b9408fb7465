//! Export page: format, per-format options and a live HTML preview.

use crate::export::{ExportFormat, DEFAULT_CUSTOM_COLOR};
use crate::html::html_escape;
use crate::models::Document;
use crate::routing::{document_path, export_query, href};

const FONT_SIZES: [u32; 5] = [10, 11, 12, 14, 16];

fn format_options() -> String {
    ExportFormat::ALL
        .iter()
        .map(|f| format!(r#"<option value="{}">{}</option>"#, f.extension(), f.label()))
        .collect()
}

fn theme_select(id: &str) -> String {
    format!(
        r#"<select id="{id}" onchange="onThemeChange('{id}')">
            <option value="dark">Escuro</option>
            <option value="light">Claro</option>
            <option value="custom">Personalizado</option>
        </select>"#,
        id = id
    )
}

/// Picker shown when no document was chosen.
fn document_picker(documents: &[Document]) -> String {
    if documents.is_empty() {
        return r#"<h1>Exportar Documento</h1><p class="empty-state">Nenhum documento para exportar.</p>"#
            .to_string();
    }
    let items: String = documents
        .iter()
        .map(|d| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                html_escape(&href(&export_query(&d.id))),
                html_escape(&d.name)
            )
        })
        .collect();
    format!(
        r#"<h1>Exportar Documento</h1>
        <div class="panel">
            <h3>Escolha um documento</h3>
            <ul>{}</ul>
        </div>"#,
        items
    )
}

pub fn render_export(doc: Option<&Document>, documents: &[Document]) -> (String, String) {
    let doc = match doc {
        Some(doc) => doc,
        None => return (document_picker(documents), String::new()),
    };

    let font_sizes: String = FONT_SIZES
        .iter()
        .map(|s| {
            format!(
                r#"<option value="{s}"{sel}>{s}pt</option>"#,
                s = s,
                sel = if *s == 12 { " selected" } else { "" }
            )
        })
        .collect();

    let content = format!(
        r#"<h1>Exportar Documento</h1>
        <p class="doc-meta">{name}</p>
        <div class="two-col">
            <div class="panel">
                <h3>Configurações de Exportação</h3>
                <div class="form-row">
                    <label for="export-format">Formato</label>
                    <select id="export-format" onchange="onFormatChange()">{formats}</select>
                </div>

                <div id="pdf-config" class="format-config">
                    <div class="form-row">
                        <label for="pdf-page-size">Tamanho da página</label>
                        <select id="pdf-page-size">
                            <option value="a4">A4</option>
                            <option value="letter">Carta</option>
                            <option value="legal">Ofício</option>
                        </select>
                    </div>
                    <div class="form-row">
                        <label for="pdf-orientation">Orientação</label>
                        <select id="pdf-orientation">
                            <option value="portrait">Retrato</option>
                            <option value="landscape">Paisagem</option>
                        </select>
                    </div>
                    <div class="form-row">
                        <label for="pdf-theme">Tema</label>
                        {pdf_theme}
                    </div>
                    <div class="form-row hidden" id="pdf-theme-color">
                        <label for="pdf-theme-custom">Cor de fundo</label>
                        <input type="text" id="pdf-theme-custom" value="{color}" placeholder="{color}">
                    </div>
                    <div class="form-check"><input type="checkbox" id="pdf-include-metadata" checked><label for="pdf-include-metadata">Incluir metadados</label></div>
                </div>

                <div id="docx-config" class="format-config hidden">
                    <div class="form-row">
                        <label for="docx-font-size">Tamanho da fonte</label>
                        <select id="docx-font-size">{font_sizes}</select>
                    </div>
                    <div class="form-check"><input type="checkbox" id="docx-include-toc"><label for="docx-include-toc">Incluir sumário</label></div>
                </div>

                <div id="html-config" class="format-config hidden">
                    <div class="form-row">
                        <label for="html-theme">Tema</label>
                        {html_theme}
                    </div>
                    <div class="form-row hidden" id="html-theme-color">
                        <label for="html-theme-custom">Cor de fundo</label>
                        <input type="text" id="html-theme-custom" value="{color}" placeholder="{color}">
                    </div>
                    <div class="form-check"><input type="checkbox" id="html-include-styles" checked><label for="html-include-styles">Incluir estilos</label></div>
                </div>

                <button class="btn-primary" onclick="exportDocument()">Exportar</button>
                <a class="btn" href="{json_href}">Baixar JSON</a>
                <div class="message" id="export-message"></div>
            </div>
            <div class="panel">
                <h3>Preview</h3>
                <iframe id="export-preview" class="preview" style="width: 100%; border: none;" title="Preview"></iframe>
            </div>
        </div>"#,
        name = html_escape(&doc.name),
        formats = format_options(),
        pdf_theme = theme_select("pdf-theme"),
        html_theme = theme_select("html-theme"),
        color = DEFAULT_CUSTOM_COLOR,
        font_sizes = font_sizes,
        json_href = html_escape(&document_path(&doc.id, &["json"])),
    );

    let script = format!(
        r#"
    const exportPath = {path};

    function selectedFormat() {{
        return document.getElementById('export-format').value;
    }}

    function onFormatChange() {{
        const format = selectedFormat();
        ['pdf', 'docx', 'html'].forEach(f => {{
            document.getElementById(f + '-config').classList.toggle('hidden', f !== format);
        }});
        refreshPreview();
    }}

    function onThemeChange(id) {{
        const custom = document.getElementById(id).value === 'custom';
        document.getElementById(id + '-color').classList.toggle('hidden', !custom);
        refreshPreview();
    }}

    function exportParams() {{
        const format = selectedFormat();
        const params = new URLSearchParams();
        if (format === 'pdf') {{
            params.set('pageSize', document.getElementById('pdf-page-size').value);
            params.set('orientation', document.getElementById('pdf-orientation').value);
            params.set('theme', document.getElementById('pdf-theme').value);
            params.set('customColor', document.getElementById('pdf-theme-custom').value.trim());
            params.set('includeMetadata', document.getElementById('pdf-include-metadata').checked);
        }} else if (format === 'docx') {{
            params.set('fontSize', document.getElementById('docx-font-size').value);
            params.set('includeToc', document.getElementById('docx-include-toc').checked);
        }} else if (format === 'html') {{
            params.set('theme', document.getElementById('html-theme').value);
            params.set('customColor', document.getElementById('html-theme-custom').value.trim());
            params.set('includeStyles', document.getElementById('html-include-styles').checked);
        }}
        return params;
    }}

    function refreshPreview() {{
        const params = exportParams();
        const format = selectedFormat();
        if (format !== 'pdf' && format !== 'html') {{
            params.set('theme', 'light');
        }}
        params.set('download', 'false');
        document.getElementById('export-preview').src = exportPath + '/html?' + params.toString();
    }}

    async function exportDocument() {{
        const message = document.getElementById('export-message');
        const url = exportPath + '/' + selectedFormat() + '?' + exportParams().toString();
        message.textContent = 'Gerando arquivo...';
        message.className = 'message';
        try {{
            const response = await fetch(url);
            if (!response.ok) {{
                const data = await response.json().catch(() => ({{}}));
                throw new Error(data.error || response.statusText);
            }}
            const blob = await response.blob();
            downloadBlob(blob, downloadName(response, 'documento.' + selectedFormat()));
            if (response.headers.get('X-Export-Fallback') === 'true') {{
                message.textContent = 'Exportação concluída como HTML para impressão';
            }} else {{
                message.textContent = 'Exportação concluída';
            }}
            message.className = 'message success';
        }} catch (err) {{
            message.textContent = 'Erro na exportação: ' + err.message;
            message.className = 'message error';
        }}
    }}

    document.querySelectorAll('.format-config input, .format-config select')
        .forEach(el => el.addEventListener('change', refreshPreview));
    refreshPreview();
"#,
        path = serde_json::Value::String(document_path(&doc.id, &["export"])),
    );

    (content, script)
}
