//! Import page: file upload with preview, and pasted JSON.

use crate::html::html_escape;
use crate::import::{format_file_size, FileKind};

fn accept_list() -> String {
    let mut extensions: Vec<&str> = Vec::new();
    for kind in FileKind::ALL {
        for ext in kind.description().1 {
            if !extensions.contains(ext) {
                extensions.push(*ext);
            }
        }
    }
    extensions.join(",")
}

fn supported_formats() -> String {
    let mut seen = Vec::new();
    let mut html = String::from("<ul>");
    for kind in FileKind::ALL {
        let (label, extensions) = kind.description();
        if seen.contains(&label) {
            continue;
        }
        seen.push(label);
        html.push_str(&format!("<li>{} ({})</li>", label, extensions.join(", ")));
    }
    html.push_str("</ul>");
    html
}

pub fn render_import(categories: &[String], max_bytes: u64) -> (String, String) {
    let category_options: String = categories
        .iter()
        .map(|c| format!(r#"<option value="{}">"#, html_escape(c)))
        .collect();

    let content = format!(
        r#"<h1>Importar Documento</h1>
        <div class="two-col">
            <div class="panel">
                <h3>Selecionar Arquivo</h3>
                <div class="drop-area" id="drop-area">
                    <p>Arraste um arquivo aqui ou</p>
                    <button type="button" onclick="document.getElementById('file-input').click()">Escolher arquivo</button>
                    <p><small>Tamanho máximo: {max_size}</small></p>
                </div>
                <input type="file" id="file-input" class="hidden" accept="{accept}">
                <div class="file-info hidden" id="file-info"></div>

                <div class="form-row" style="margin-top: 1rem">
                    <label for="import-category">Categoria</label>
                    <input type="text" id="import-category" list="import-category-list" placeholder="Sem Categoria">
                    <datalist id="import-category-list">{category_options}</datalist>
                </div>
                <div class="form-row">
                    <label for="import-tags">Tags (separadas por vírgula)</label>
                    <input type="text" id="import-tags">
                </div>

                <div class="form-check"><input type="checkbox" id="opt-preserveLineBreaks" checked><label for="opt-preserveLineBreaks">Preservar quebras de linha</label></div>
                <div class="form-check"><input type="checkbox" id="opt-preservePages" checked><label for="opt-preservePages">Marcar páginas (PDF)</label></div>
                <div class="form-check"><input type="checkbox" id="opt-processExternalLinks" checked><label for="opt-processExternalLinks">Processar links</label></div>
                <div class="form-check"><input type="checkbox" id="opt-extractBodyOnly" checked><label for="opt-extractBodyOnly">Somente o corpo (HTML)</label></div>
                <div class="form-row">
                    <label for="opt-maxPages">Máximo de páginas (PDF, vazio = todas)</label>
                    <input type="text" id="opt-maxPages" inputmode="numeric">
                </div>

                <button class="btn-primary" id="process-button" onclick="processFile()" disabled>Processar arquivo</button>
                <div class="message" id="process-message"></div>

                <h3 style="margin-top: 1rem">Formatos suportados</h3>
                {formats}
            </div>
            <div class="panel">
                <h3>Preview</h3>
                <div class="preview" id="file-preview"><p class="empty-state">Nenhum arquivo processado</p></div>
                <div class="file-stats hidden" id="file-stats"></div>
                <button class="btn-success" id="confirm-import-button" onclick="confirmImport()" disabled>Importar documento</button>
                <div class="message" id="import-message"></div>
            </div>
        </div>

        <div class="panel">
            <h3>Importar JSON</h3>
            <textarea id="import-json" rows="10" placeholder="Cole aqui o JSON do documento..."></textarea>
            <button onclick="validateJson()">Visualizar/Validar</button>
            <div class="json-preview hidden" id="json-preview"></div>
            <button class="btn-success" id="confirm-json-button" onclick="importJson()" disabled>Importar documento</button>
            <div class="message" id="json-message"></div>
        </div>"#,
        max_size = format_file_size(max_bytes),
        accept = accept_list(),
        category_options = category_options,
        formats = supported_formats(),
    );

    let script = r#"
    let selectedFile = null;
    const OPTION_NAMES = ['preserveLineBreaks', 'preservePages', 'processExternalLinks', 'extractBodyOnly'];

    function setMessage(id, text, kind) {
        const el = document.getElementById(id);
        el.textContent = text;
        el.className = 'message' + (kind ? ' ' + kind : '');
    }

    function formatSize(bytes) {
        const units = ['B', 'KB', 'MB', 'GB'];
        let size = bytes, unit = 0;
        while (size >= 1024 && unit < units.length - 1) { size /= 1024; unit++; }
        return size.toFixed(1) + ' ' + units[unit];
    }

    function selectFile(file) {
        selectedFile = file;
        const info = document.getElementById('file-info');
        info.textContent = file.name + ' (' + formatSize(file.size) + ')';
        info.classList.remove('hidden');
        document.getElementById('process-button').disabled = false;
        document.getElementById('confirm-import-button').disabled = true;
        setMessage('process-message', '');
    }

    function buildForm() {
        const form = new FormData();
        form.append('file', selectedFile, selectedFile.name);
        form.append('category', document.getElementById('import-category').value);
        form.append('tags', document.getElementById('import-tags').value);
        OPTION_NAMES.forEach(name => {
            form.append(name, document.getElementById('opt-' + name).checked ? 'true' : 'false');
        });
        const maxPages = document.getElementById('opt-maxPages').value.trim();
        if (maxPages) form.append('maxPages', maxPages);
        return form;
    }

    async function postForm(url) {
        const response = await fetch(url, { method: 'POST', body: buildForm() });
        const data = await response.json();
        if (!response.ok) throw new Error(data.error || response.statusText);
        return data;
    }

    async function processFile() {
        if (!selectedFile) return;
        setMessage('process-message', 'Processando...');
        try {
            const result = await postForm('/api/import/preview');
            if (!result.success) {
                setMessage('process-message', result.error, 'error');
                return;
            }
            document.getElementById('file-preview').innerHTML = result.content;
            const stats = document.getElementById('file-stats');
            stats.textContent = 'Título: ' + result.title + ' · ' +
                (result.metadata.words || 0) + ' palavras · ' +
                (result.metadata.characters || 0) + ' caracteres';
            stats.classList.remove('hidden');
            document.getElementById('confirm-import-button').disabled = false;
            setMessage('process-message', 'Arquivo processado com sucesso', 'success');
        } catch (err) {
            setMessage('process-message', err.message, 'error');
        }
    }

    async function confirmImport() {
        if (!selectedFile) return;
        setMessage('import-message', 'Importando...');
        try {
            const result = await postForm('/api/import/file');
            if (!result.success) {
                setMessage('import-message', result.error, 'error');
                return;
            }
            window.location.href = '/?view=editor&doc=' + encodeURIComponent(result.documentId);
        } catch (err) {
            setMessage('import-message', err.message, 'error');
        }
    }

    document.getElementById('file-input').addEventListener('change', e => {
        if (e.target.files.length) selectFile(e.target.files[0]);
    });

    const dropArea = document.getElementById('drop-area');
    ['dragenter', 'dragover'].forEach(type => dropArea.addEventListener(type, e => {
        e.preventDefault();
        dropArea.classList.add('dragover');
    }));
    ['dragleave', 'drop'].forEach(type => dropArea.addEventListener(type, e => {
        e.preventDefault();
        dropArea.classList.remove('dragover');
    }));
    dropArea.addEventListener('drop', e => {
        if (e.dataTransfer.files.length) selectFile(e.dataTransfer.files[0]);
    });

    let parsedJson = null;

    function validateJson() {
        const preview = document.getElementById('json-preview');
        const button = document.getElementById('confirm-json-button');
        try {
            parsedJson = JSON.parse(document.getElementById('import-json').value);
            if (typeof parsedJson !== 'object' || parsedJson === null || Array.isArray(parsedJson)) {
                throw new Error('O JSON deve ser um objeto de documento');
            }
            preview.textContent = 'Nome: ' + (parsedJson.name || '(sem nome)') + '\n' +
                'Categoria: ' + (parsedJson.category || 'Sem Categoria') + '\n' +
                'Tags: ' + ((parsedJson.tags || []).join(', ') || '-') + '\n' +
                'Conteúdo: ' + String(parsedJson.content || '').length + ' caracteres';
            preview.classList.remove('hidden');
            button.disabled = false;
            setMessage('json-message', '');
        } catch (err) {
            parsedJson = null;
            preview.classList.add('hidden');
            button.disabled = true;
            setMessage('json-message', 'JSON inválido: ' + err.message, 'error');
        }
    }

    async function importJson() {
        if (!parsedJson) return;
        try {
            const doc = await api('POST', '/api/import/json', parsedJson);
            window.location.href = '/?view=editor&doc=' + encodeURIComponent(doc.id);
        } catch (err) {
            setMessage('json-message', err.message, 'error');
        }
    }
"#
    .to_string();

    (content, script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_list_covers_extensions() {
        let accept = accept_list();
        for ext in [".pdf", ".docx", ".doc", ".html", ".htm", ".txt", ".md", ".rtf"] {
            assert!(accept.split(',').any(|e| e == ext), "missing {}", ext);
        }
        assert_eq!(accept.matches(".docx").count(), 1);
    }

    #[test]
    fn test_supported_formats_listed_once() {
        let list = supported_formats();
        assert_eq!(list.matches("Documentos Microsoft Word").count(), 1);
        assert!(list.contains("Rich Text Format (.rtf)"));
    }

    #[test]
    fn test_render_import() {
        let (content, script) = render_import(&["Trabalho".to_string()], 10 * 1024 * 1024);
        assert!(content.contains("Tamanho máximo: 10.0 MB"));
        assert!(content.contains(r#"<option value="Trabalho">"#));
        assert!(script.contains("/api/import/preview"));
        assert!(script.contains("/api/import/json"));
    }
}
