//! Settings page: preferences, backup export/import and clearing the store.

use crate::models::Preferences;

pub fn render_settings(preferences: &Preferences, document_count: usize) -> (String, String) {
    let checked = |on: bool| if on { " checked" } else { "" };

    let content = format!(
        r#"<h1>Configurações</h1>

        <div class="panel">
            <h3>Armazenamento Local</h3>
            <div class="form-check">
                <input type="checkbox" id="settings-auto-save-toggle" onchange="setAutoSave(this.checked)"{auto_save}>
                <label for="settings-auto-save-toggle">Salvar automaticamente enquanto escrevo</label>
            </div>
            <div class="form-check">
                <input type="checkbox" id="settings-sidebar-toggle" onchange="setSidebar(this.checked)"{sidebar}>
                <label for="settings-sidebar-toggle">Mostrar barra lateral</label>
            </div>
            <p><small>{count} documento(s) armazenado(s).</small></p>
            <button class="btn-danger" onclick="clearAllDocuments()">Apagar todos os documentos</button>
        </div>

        <div class="panel">
            <h3>Exportar Documentos</h3>
            <p><small>Baixa todos os documentos em um único arquivo JSON.</small></p>
            <a class="btn btn-primary" href="/api/export/all">Exportar todos</a>
        </div>

        <div class="panel">
            <h3>Importar Documentos</h3>
            <p><small>Importa um backup JSON. Os documentos recebem novos identificadores e nada é sobrescrito.</small></p>
            <input type="file" id="backup-input" accept=".json" onchange="document.getElementById('backup-button').disabled = !this.files.length">
            <button class="btn-primary" id="backup-button" onclick="importBackup()" disabled>Importar</button>
            <div class="message" id="backup-message"></div>
        </div>"#,
        auto_save = checked(preferences.auto_save_enabled),
        sidebar = checked(preferences.sidebar_visible),
        count = document_count,
    );

    let script = r#"
    async function setSidebar(visible) {
        document.getElementById('sidebar').classList.toggle('hidden', !visible);
        try {
            await api('PUT', '/api/settings', { sidebarVisible: visible });
        } catch (err) {
            console.error('Failed to save sidebar preference:', err);
        }
    }

    async function clearAllDocuments() {
        if (!confirm('Apagar TODOS os documentos?\n\nEsta ação não pode ser desfeita.')) return;
        try {
            const result = await api('DELETE', '/api/documents');
            alert(result.deleted + ' documento(s) apagado(s).');
            window.location.href = '/?view=dashboard';
        } catch (err) {
            alert('Erro ao apagar documentos: ' + err.message);
        }
    }

    async function importBackup() {
        const input = document.getElementById('backup-input');
        const message = document.getElementById('backup-message');
        if (!input.files.length) return;
        try {
            const text = await input.files[0].text();
            const data = JSON.parse(text);
            const result = await api('POST', '/api/import/backup', data);
            message.textContent = result.imported + ' documento(s) importado(s).';
            message.className = 'message success';
        } catch (err) {
            message.textContent = 'Erro ao importar: ' + err.message;
            message.className = 'message error';
        }
    }
"#
    .to_string();

    (content, script)
}
