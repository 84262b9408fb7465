//! Shared HTML components: navigation bar, sidebar and the page shell.

use crate::html::html_escape;
use crate::listing::group_by_category;
use crate::models::{Document, Preferences, View};
use crate::routing::{editor_query, href, view_query};

use super::styles::STYLE;

/// Everything the page shell needs besides the main content.
pub struct Layout<'a> {
    pub title: &'a str,
    pub view: View,
    pub documents: &'a [Document],
    pub current_id: Option<&'a str>,
    pub preferences: &'a Preferences,
}

// ============================================================================
// Navigation Bar
// ============================================================================

pub fn nav_bar(layout: &Layout) -> String {
    let editing = layout.view == View::Editor;
    let save_controls = if editing {
        r#"<span class="save-status" id="save-status">Salvo</span>
            <button class="btn-primary" id="save-button" onclick="saveNow()" disabled>Salvar</button>"#
    } else {
        ""
    };
    let export_href = match layout.current_id {
        Some(id) => href(&crate::routing::export_query(id)),
        None => href(&view_query(View::Export)),
    };

    format!(
        r#"<nav class="nav-bar">
            <a href="/" class="brand">Docs</a>
            <button onclick="newDocument()">Novo documento</button>
            <a href="{import}">Importar</a>
            <a href="{export}">Exportar</a>
            <a href="{settings}">Configurações</a>
            <span class="spacer"></span>
            <button onclick="toggleSidebar()" title="Mostrar/ocultar barra lateral">☰</button>
            <label><input type="checkbox" id="auto-save-toggle" onchange="setAutoSave(this.checked)"{checked}> Auto-salvar</label>
            {save_controls}
        </nav>"#,
        import = href(&view_query(View::Import)),
        export = export_href,
        settings = href(&view_query(View::Settings)),
        checked = if layout.preferences.auto_save_enabled { " checked" } else { "" },
        save_controls = save_controls,
    )
}

// ============================================================================
// Sidebar
// ============================================================================

/// Document tree grouped by category.
pub fn sidebar(documents: &[Document], current_id: Option<&str>, visible: bool) -> String {
    let mut html = format!(
        r#"<aside class="sidebar{}" id="sidebar">"#,
        if visible { "" } else { " hidden" }
    );

    if documents.is_empty() {
        html.push_str(r#"<p class="empty-state">Nenhum documento</p>"#);
    }

    for (category, docs) in group_by_category(documents) {
        html.push_str(&format!("<h4>{}</h4><ul>", html_escape(&category)));
        let mut docs = docs;
        docs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        for doc in docs {
            let active = if Some(doc.id.as_str()) == current_id { " class=\"active\"" } else { "" };
            html.push_str(&format!(
                r#"<li><a href="{}"{} title="{}">{}</a></li>"#,
                html_escape(&href(&editor_query(&doc.id))),
                active,
                html_escape(&doc.name),
                html_escape(&doc.name),
            ));
        }
        html.push_str("</ul>");
    }

    html.push_str(&format!(
        r##"<div class="sidebar-actions">
            <ul>
                <li><a href="#" onclick="newDocument(); return false;">+ Novo documento</a></li>
                <li><a href="{}">Importar documento</a></li>
                <li><a href="{}">Configurações</a></li>
            </ul>
        </div>
    </aside>"##,
        href(&view_query(View::Import)),
        href(&view_query(View::Settings)),
    ));
    html
}

// ============================================================================
// Base HTML Template
// ============================================================================

/// JSON embedded in a `<script>` block; `<` is escaped so the payload can't
/// close the tag.
pub fn json_for_script(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

pub fn base_html(layout: &Layout, content: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Docs</title>
    <style>{style}</style>
</head>
<body>
    {nav}
    <div class="layout">
        {sidebar}
        <main class="main">
            <div class="container">
                {content}
            </div>
        </main>
    </div>
    <script>
    async function api(method, url, body) {{
        const options = {{ method, headers: {{}} }};
        if (body !== undefined) {{
            options.headers['Content-Type'] = 'application/json';
            options.body = JSON.stringify(body);
        }}
        const response = await fetch(url, options);
        const text = await response.text();
        const data = text ? JSON.parse(text) : null;
        if (!response.ok) {{
            throw new Error((data && data.error) || response.statusText);
        }}
        return data;
    }}

    async function newDocument() {{
        const name = prompt('Nome do novo documento:', '');
        if (name === null) return;
        try {{
            const doc = await api('POST', '/api/documents', {{ name }});
            window.location.href = '/?view=editor&doc=' + encodeURIComponent(doc.id);
        }} catch (err) {{
            alert('Erro ao criar documento: ' + err.message);
        }}
    }}

    async function confirmDelete(el) {{
        const id = el.dataset.id;
        const name = el.dataset.name;
        if (!confirm('Excluir "' + name + '"?\n\nEsta ação não pode ser desfeita.')) return;
        try {{
            await api('DELETE', '/api/documents/' + encodeURIComponent(id));
            window.location.href = '/?view=dashboard';
        }} catch (err) {{
            alert('Erro ao excluir: ' + err.message);
        }}
    }}

    async function toggleSidebar() {{
        const sidebar = document.getElementById('sidebar');
        const hidden = sidebar.classList.toggle('hidden');
        try {{
            await api('PUT', '/api/settings', {{ sidebarVisible: !hidden }});
        }} catch (err) {{
            console.error('Failed to save sidebar preference:', err);
        }}
    }}

    async function setAutoSave(enabled) {{
        document.querySelectorAll('#auto-save-toggle, #settings-auto-save-toggle')
            .forEach(el => {{ el.checked = enabled; }});
        window.autoSaveEnabled = enabled;
        try {{
            await api('PUT', '/api/settings', {{ autoSaveEnabled: enabled }});
        }} catch (err) {{
            console.error('Failed to save auto-save preference:', err);
        }}
    }}

    function downloadName(response, fallback) {{
        const header = response.headers.get('Content-Disposition') || '';
        const encoded = header.match(/filename\*=UTF-8''([^;]+)/);
        if (encoded) return decodeURIComponent(encoded[1]);
        const plain = header.match(/filename="([^"]+)"/);
        return plain ? plain[1] : fallback;
    }}

    function downloadBlob(blob, filename) {{
        const href = URL.createObjectURL(blob);
        const a = document.createElement('a');
        a.href = href;
        a.download = filename;
        document.body.appendChild(a);
        a.click();
        a.remove();
        setTimeout(() => URL.revokeObjectURL(href), 1000);
    }}

    window.autoSaveEnabled = {auto_save};
    {script}
    </script>
</body>
</html>"#,
        title = html_escape(layout.title),
        style = STYLE,
        nav = nav_bar(layout),
        sidebar = sidebar(
            layout.documents,
            layout.current_id,
            layout.preferences.sidebar_visible
        ),
        content = content,
        auto_save = layout.preferences.auto_save_enabled,
        script = script,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(id: &str, name: &str, category: &str) -> Document {
        let now = Utc::now();
        Document {
            id: id.to_string(),
            name: name.to_string(),
            content: String::new(),
            category: category.to_string(),
            tags: vec![],
            created: now,
            last_modified: now,
        }
    }

    #[test]
    fn test_sidebar_groups_and_escapes() {
        let docs = vec![doc("a", "Zeta & co", "Work"), doc("b", "alpha", "Work"), doc("c", "x", "")];
        let html = sidebar(&docs, Some("b"), true);
        assert!(html.contains("<h4>Sem Categoria</h4>"));
        assert!(html.contains("Zeta &amp; co"));
        assert!(html.find("alpha").unwrap() < html.find("Zeta &amp; co").unwrap());
        assert!(html.contains(r#"class="active" title="alpha""#));
        assert!(!sidebar(&docs, None, false).contains(r#"class="sidebar""#));
    }

    #[test]
    fn test_json_for_script_escapes_tags() {
        let value = serde_json::json!({ "content": "</script><b>" });
        let out = json_for_script(&value);
        assert!(!out.contains("</script>"));
        assert!(out.contains("\\u003c/script>"));
    }

    #[test]
    fn test_base_html_reflects_preferences() {
        let prefs = Preferences {
            auto_save_enabled: false,
            sidebar_visible: false,
            ..Preferences::default()
        };
        let layout = Layout {
            title: "Painel",
            view: View::Dashboard,
            documents: &[],
            current_id: None,
            preferences: &prefs,
        };
        let page = base_html(&layout, "<p>corpo</p>", "");
        assert!(page.contains("<title>Painel - Docs</title>"));
        assert!(page.contains("window.autoSaveEnabled = false;"));
        assert!(page.contains(r#"class="sidebar hidden""#));
        assert!(!page.contains("save-button"));
    }
}
