//! Rich-text editor page: contenteditable body, formatting toolbar,
//! properties form, share link and debounced auto-save.

use serde_json::json;

use crate::config::AUTO_SAVE_DELAY_MS;
use crate::html::{content_word_count, html_escape, sanitize};
use crate::models::Document;
use crate::routing::{document_path, export_query, href};

use super::components::json_for_script;

// ============================================================================
// Toolbar
// ============================================================================

/// `(command, value, label, title)` for each toolbar button; `None` is a separator.
const TOOLBAR: &[Option<(&str, &str, &str, &str)>] = &[
    Some(("undo", "", "↶", "Desfazer")),
    Some(("redo", "", "↷", "Refazer")),
    None,
    Some(("bold", "", "<b>B</b>", "Negrito")),
    Some(("italic", "", "<i>I</i>", "Itálico")),
    Some(("underline", "", "<u>U</u>", "Sublinhado")),
    Some(("strikeThrough", "", "<s>S</s>", "Tachado")),
    None,
    Some(("insertUnorderedList", "", "• Lista", "Lista de Marcadores")),
    Some(("insertOrderedList", "", "1. Lista", "Lista Numerada")),
    Some(("indent", "", "→", "Aumentar Recuo")),
    Some(("outdent", "", "←", "Diminuir Recuo")),
    None,
    Some(("justifyLeft", "", "⯇", "Alinhar à Esquerda")),
    Some(("justifyCenter", "", "≡", "Alinhar ao Centro")),
    Some(("justifyRight", "", "⯈", "Alinhar à Direita")),
    Some(("justifyFull", "", "☰", "Justificar")),
    None,
    Some(("createLink", "", "🔗", "Inserir Link")),
    Some(("unlink", "", "⛓", "Remover Link")),
    Some(("insertHorizontalRule", "", "―", "Linha Horizontal")),
    Some(("formatBlock", "blockquote", "❝", "Citação")),
    Some(("formatBlock", "pre", "&lt;/&gt;", "Bloco de Código")),
    None,
    Some(("removeFormat", "", "⌫", "Limpar Formatação")),
];

const BLOCK_FORMATS: [(&str, &str); 7] = [
    ("p", "Parágrafo"),
    ("h1", "Título 1"),
    ("h2", "Título 2"),
    ("h3", "Título 3"),
    ("h4", "Título 4"),
    ("h5", "Título 5"),
    ("h6", "Título 6"),
];

fn toolbar() -> String {
    let mut html = String::from(r#"<div class="toolbar" id="toolbar">"#);
    for entry in TOOLBAR {
        match entry {
            Some((command, value, label, title)) => html.push_str(&format!(
                r#"<button type="button" data-command="{}" data-value="{}" title="{}">{}</button>"#,
                command, value, title, label
            )),
            None => html.push_str(r#"<span class="sep"></span>"#),
        }
    }
    html.push_str(r#"<select id="format-block-select" title="Formato">"#);
    for (tag, label) in BLOCK_FORMATS {
        html.push_str(&format!(r#"<option value="{}">{}</option>"#, tag, label));
    }
    html.push_str("</select></div>");
    html
}

// ============================================================================
// Editor Template
// ============================================================================

/// Main content and script for the editor view.
///
/// `categories` feeds the datalist of the properties form.
pub fn render_editor(doc: &Document, categories: &[String]) -> (String, String) {
    let category_options: String = categories
        .iter()
        .map(|c| format!(r#"<option value="{}">"#, html_escape(c)))
        .collect();

    let content = format!(
        r#"<div class="editor-header">
            <div>
                <h1 id="doc-title">{name}</h1>
                <div class="doc-meta">
                    📁 <span id="doc-category">{category}</span>
                    · Criado em {created}
                    · Modificado em <span id="doc-modified">{modified}</span>
                    · <span id="word-count">{words}</span> palavras
                </div>
            </div>
            <div class="actions">
                <button onclick="toggleProperties()">Propriedades</button>
                <button onclick="shareDocument()">Compartilhar</button>
                <a class="btn" href="{json_href}">JSON</a>
                <a class="btn" href="{export_href}">Exportar</a>
                <button class="btn-danger" data-id="{id}" data-name="{name}" onclick="confirmDelete(this)">Excluir</button>
            </div>
        </div>

        <div class="panel hidden" id="properties-panel">
            <h3>Propriedades do Documento</h3>
            <form id="properties-form" onsubmit="saveProperties(event)">
                <div class="form-row">
                    <label for="prop-name">Nome</label>
                    <input type="text" id="prop-name" value="{name}" required>
                </div>
                <div class="form-row">
                    <label for="prop-category">Categoria</label>
                    <input type="text" id="prop-category" value="{category}" list="category-list">
                    <datalist id="category-list">{category_options}</datalist>
                </div>
                <div class="form-row">
                    <label for="prop-tags">Tags (separadas por vírgula)</label>
                    <input type="text" id="prop-tags" value="{tags}">
                </div>
                <button type="submit" class="btn-primary">Salvar propriedades</button>
                <span class="message" id="properties-message"></span>
            </form>
        </div>

        <div class="panel hidden" id="share-panel">
            <h3>Compartilhar Visualização</h3>
            <div class="share-box">
                <input type="text" id="share-url" readonly>
                <button onclick="copyShareUrl()">Copiar</button>
            </div>
            <small>Copie o link acima para compartilhar a visualização deste documento.</small>
        </div>

        {toolbar}
        <div class="document-editor" id="document-editor" contenteditable="true" data-document-id="{id}">{body}</div>"#,
        name = html_escape(&doc.name),
        category = html_escape(doc.category_or_default()),
        created = doc.created.format("%d/%m/%Y %H:%M"),
        modified = doc.last_modified.format("%d/%m/%Y %H:%M"),
        words = content_word_count(&doc.content),
        json_href = html_escape(&document_path(&doc.id, &["json"])),
        export_href = html_escape(&href(&export_query(&doc.id))),
        id = html_escape(&doc.id),
        category_options = category_options,
        tags = html_escape(&doc.tags.join(", ")),
        toolbar = toolbar(),
        body = sanitize(&doc.content),
    );

    let state = json!({
        "id": doc.id,
        "apiPath": document_path(&doc.id, &[]),
        "autoSaveDelay": AUTO_SAVE_DELAY_MS,
    });

    let script = format!(
        r#"
    const docState = {state};
    const editorEl = document.getElementById('document-editor');
    let lastSavedContent = editorEl.innerHTML;
    let isDirty = false;
    let autoSaveTimer = null;
    let saving = false;

    function updateStatus(kind, text) {{
        const status = document.getElementById('save-status');
        const button = document.getElementById('save-button');
        if (status) {{
            status.textContent = text;
            status.className = 'save-status' + (kind === 'saved' ? '' : ' ' + kind);
        }}
        if (button) button.disabled = !isDirty;
    }}

    function countWords(text) {{
        const words = text.replace(/[^\wÀ-ÿ\s]/g, ' ').trim().split(/\s+/).filter(w => w.length > 0);
        return words.length;
    }}

    function markDirty() {{
        isDirty = editorEl.innerHTML !== lastSavedContent;
        updateStatus(isDirty ? 'dirty' : 'saved', isDirty ? 'Não salvo' : 'Salvo');
        document.getElementById('word-count').textContent = countWords(editorEl.innerText || '');
        if (autoSaveTimer) clearTimeout(autoSaveTimer);
        if (isDirty && window.autoSaveEnabled) {{
            autoSaveTimer = setTimeout(() => saveDocument(true), docState.autoSaveDelay);
        }}
    }}

    async function saveDocument(isAutoSave) {{
        if (saving) return;
        const content = editorEl.innerHTML;
        if (content === lastSavedContent) {{
            isDirty = false;
            updateStatus('saved', 'Salvo');
            return;
        }}
        saving = true;
        updateStatus('saving', isAutoSave ? 'Auto-salvando...' : 'Salvando...');
        try {{
            const doc = await api('PUT', docState.apiPath, {{ content }});
            lastSavedContent = content;
            isDirty = editorEl.innerHTML !== lastSavedContent;
            document.getElementById('doc-modified').textContent =
                new Date(doc.lastModified).toLocaleString('pt-BR', {{ dateStyle: 'short', timeStyle: 'short' }});
            updateStatus(isDirty ? 'dirty' : 'saved', isDirty ? 'Não salvo' : 'Salvo');
        }} catch (err) {{
            console.error('Save failed:', err);
            updateStatus('error', 'Erro ao salvar');
        }} finally {{
            saving = false;
        }}
    }}

    function saveNow() {{
        if (autoSaveTimer) clearTimeout(autoSaveTimer);
        saveDocument(false);
    }}

    function runCommand(command, value) {{
        if (command === 'createLink') {{
            const url = prompt('Digite a URL:', 'https://');
            if (!url || url === 'https://') return;
            value = url;
        }} else if (command === 'formatBlock') {{
            value = '<' + value + '>';
        }}
        editorEl.focus();
        document.execCommand(command, false, value || null);
        markDirty();
    }}

    document.querySelectorAll('#toolbar button[data-command]').forEach(button => {{
        button.addEventListener('mousedown', e => e.preventDefault());
        button.addEventListener('click', () => runCommand(button.dataset.command, button.dataset.value));
    }});

    document.getElementById('format-block-select').addEventListener('change', e => {{
        runCommand('formatBlock', e.target.value);
    }});

    editorEl.addEventListener('input', markDirty);

    document.addEventListener('keydown', e => {{
        if ((e.ctrlKey || e.metaKey) && e.key.toLowerCase() === 's') {{
            e.preventDefault();
            saveNow();
        }}
    }});

    window.addEventListener('beforeunload', e => {{
        if (isDirty) {{
            e.preventDefault();
            e.returnValue = '';
        }}
    }});

    function toggleProperties() {{
        document.getElementById('properties-panel').classList.toggle('hidden');
    }}

    async function saveProperties(event) {{
        event.preventDefault();
        const message = document.getElementById('properties-message');
        const name = document.getElementById('prop-name').value.trim();
        if (!name) {{
            message.textContent = 'O nome do documento não pode estar vazio';
            message.className = 'message error';
            return;
        }}
        try {{
            const doc = await api('PUT', docState.apiPath + '/properties', {{
                name,
                category: document.getElementById('prop-category').value,
                tags: document.getElementById('prop-tags').value
            }});
            document.getElementById('doc-title').textContent = doc.name;
            document.getElementById('doc-category').textContent = doc.category;
            message.textContent = 'Propriedades salvas';
            message.className = 'message success';
        }} catch (err) {{
            message.textContent = err.message;
            message.className = 'message error';
        }}
    }}

    async function shareDocument() {{
        if (isDirty) await saveDocument(false);
        try {{
            const data = await api('GET', docState.apiPath + '/share');
            document.getElementById('share-url').value = data.url;
            document.getElementById('share-panel').classList.remove('hidden');
        }} catch (err) {{
            alert('Erro ao gerar link: ' + err.message);
        }}
    }}

    function copyShareUrl() {{
        const input = document.getElementById('share-url');
        navigator.clipboard.writeText(input.value).catch(() => {{
            input.select();
            document.execCommand('copy');
        }});
    }}

    updateStatus('saved', 'Salvo');
"#,
        state = json_for_script(&state),
    );

    (content, script)
}
