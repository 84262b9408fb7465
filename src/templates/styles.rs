//! CSS for the editor UI.

pub const STYLE: &str = r#"
/* Dark theme */
:root {
    --bg: #1c1f23;
    --surface: #23272b;
    --surface-2: #2b3035;
    --fg: #e0e6eb;
    --muted: #8a949e;
    --border: #3a4047;
    --link: #4dabf7;
    --link-hover: #74c0fc;
    --accent: #0d6efd;
    --danger: #e5534b;
    --success: #3fb950;
    --code-bg: #2d333b;
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
    min-height: 100vh;
    display: flex;
    flex-direction: column;
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

h1, h2, h3 { font-weight: 600; margin-bottom: 0.5em; }

button, .btn {
    padding: 0.4rem 0.9rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    background: var(--surface-2);
    color: var(--fg);
    cursor: pointer;
    font-family: inherit;
    font-size: 0.9rem;
}
button:hover, .btn:hover { border-color: var(--link); text-decoration: none; }
button:disabled { opacity: 0.5; cursor: default; }
.btn-primary { background: var(--accent); border-color: var(--accent); color: white; }
.btn-danger { color: var(--danger); border-color: var(--danger); background: none; }
.btn-success { background: var(--success); border-color: var(--success); color: white; }

input[type=text], input[type=search], select, textarea {
    padding: 0.4rem 0.75rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    background: var(--surface);
    color: var(--fg);
    font-family: inherit;
    font-size: 0.9rem;
}
textarea { width: 100%; font-family: "SF Mono", "Consolas", "Liberation Mono", monospace; }

/* Navigation */

.nav-bar {
    position: sticky;
    top: 0;
    background: var(--surface);
    border-bottom: 1px solid var(--border);
    padding: 0.5rem 1rem;
    display: flex;
    gap: 1rem;
    align-items: center;
    flex-wrap: wrap;
    z-index: 100;
}
.nav-bar .brand { font-weight: 700; color: var(--fg); }
.nav-bar .spacer { flex: 1; }
.nav-bar label { font-size: 0.85rem; color: var(--muted); display: flex; gap: 0.35rem; align-items: center; }
.save-status { font-size: 0.8rem; color: var(--muted); min-width: 6rem; text-align: right; }
.save-status.dirty { color: #e3b341; }
.save-status.error { color: var(--danger); }

/* Layout */

.layout { display: flex; flex: 1; min-height: 0; }

.sidebar {
    width: 260px;
    flex-shrink: 0;
    background: var(--surface);
    border-right: 1px solid var(--border);
    padding: 1rem 0.75rem;
    overflow-y: auto;
}
.sidebar.hidden { display: none; }
.sidebar h4 {
    font-size: 0.75rem;
    text-transform: uppercase;
    letter-spacing: 0.05em;
    color: var(--muted);
    margin: 1rem 0 0.25rem;
}
.sidebar ul { list-style: none; }
.sidebar li a {
    display: block;
    padding: 0.2rem 0.5rem;
    border-radius: 4px;
    color: var(--fg);
    white-space: nowrap;
    overflow: hidden;
    text-overflow: ellipsis;
    font-size: 0.9rem;
}
.sidebar li a.active { background: var(--surface-2); color: var(--link); }
.sidebar .sidebar-actions { border-top: 1px solid var(--border); margin-top: 1rem; padding-top: 0.75rem; }

.main { flex: 1; padding: 1.5rem 2rem; overflow-y: auto; }
.container { max-width: 1100px; margin: 0 auto; }

/* Dashboard */

.stats { display: flex; gap: 1rem; margin-bottom: 1.5rem; }
.stat {
    flex: 1;
    background: var(--surface);
    border: 1px solid var(--border);
    border-radius: 8px;
    padding: 1rem;
    text-align: center;
}
.stat .stat-number { display: block; font-size: 1.75rem; font-weight: 700; }
.stat .stat-label { font-size: 0.8rem; color: var(--muted); }

.category-tabs { display: flex; gap: 0.25rem; flex-wrap: wrap; border-bottom: 1px solid var(--border); margin-bottom: 1rem; }
.category-tabs a { padding: 0.4rem 0.9rem; border-radius: 4px 4px 0 0; color: var(--muted); }
.category-tabs a.active { background: var(--surface-2); color: var(--fg); }

.filters { display: flex; gap: 0.5rem; margin-bottom: 1rem; }
.filters input[type=search] { flex: 1; }

.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 1rem; }
.card {
    background: var(--surface);
    border: 1px solid var(--border);
    border-radius: 8px;
    padding: 1rem;
    display: flex;
    flex-direction: column;
    gap: 0.5rem;
}
.card h3 { font-size: 1.05rem; margin: 0; }
.card .excerpt { font-size: 0.85rem; color: var(--muted); flex: 1; }
.card .meta { font-size: 0.75rem; color: var(--muted); }
.card .actions { display: flex; gap: 0.5rem; }
.tag {
    display: inline-block;
    font-size: 0.7rem;
    padding: 0.1rem 0.45rem;
    background: var(--surface-2);
    border-radius: 3px;
    margin-right: 0.25rem;
}
.empty-state { color: var(--muted); text-align: center; padding: 3rem 1rem; }

/* Editor */

.toolbar {
    display: flex;
    gap: 0.25rem;
    flex-wrap: wrap;
    align-items: center;
    padding: 0.5rem;
    background: var(--surface);
    border: 1px solid var(--border);
    border-radius: 6px 6px 0 0;
}
.toolbar button { padding: 0.25rem 0.55rem; min-width: 2rem; }
.toolbar .sep { width: 1px; height: 1.5rem; background: var(--border); margin: 0 0.25rem; }

.document-editor {
    min-height: 60vh;
    padding: 2rem;
    background: var(--surface);
    border: 1px solid var(--border);
    border-top: none;
    border-radius: 0 0 6px 6px;
    outline: none;
}
.document-editor p, .shared-doc p { margin-bottom: 0.75rem; }
.document-editor ul, .document-editor ol, .shared-doc ul, .shared-doc ol { margin: 0 0 0.75rem 1.5rem; }
.document-editor blockquote, .shared-doc blockquote {
    border-left: 3px solid var(--link);
    padding-left: 1rem;
    color: var(--muted);
    margin: 1rem 0;
}
.document-editor pre, .shared-doc pre {
    background: var(--code-bg);
    padding: 1rem;
    border-radius: 4px;
    overflow-x: auto;
    margin: 1rem 0;
}
.document-editor code, .shared-doc code { font-family: "SF Mono", "Consolas", "Liberation Mono", monospace; font-size: 0.9em; }
.document-editor table, .shared-doc table { border-collapse: collapse; margin: 1rem 0; }
.document-editor td, .document-editor th, .shared-doc td, .shared-doc th { border: 1px solid var(--border); padding: 0.3rem 0.6rem; }

.editor-header { display: flex; justify-content: space-between; align-items: center; gap: 1rem; margin-bottom: 0.75rem; flex-wrap: wrap; }
.editor-header .doc-meta { font-size: 0.8rem; color: var(--muted); }
.editor-header .actions { display: flex; gap: 0.5rem; flex-wrap: wrap; }

.panel {
    background: var(--surface);
    border: 1px solid var(--border);
    border-radius: 8px;
    padding: 1.25rem;
    margin-bottom: 1rem;
}
.panel h3 { font-size: 1rem; }
.form-row { display: flex; flex-direction: column; gap: 0.25rem; margin-bottom: 0.75rem; }
.form-row label { font-size: 0.85rem; color: var(--muted); }
.form-check { display: flex; gap: 0.5rem; align-items: center; margin-bottom: 0.5rem; font-size: 0.9rem; }
.hidden { display: none; }

.share-box { display: flex; gap: 0.5rem; }
.share-box input { flex: 1; }

/* Import / export */

.two-col { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
.drop-area {
    border: 2px dashed var(--border);
    border-radius: 8px;
    padding: 2rem;
    text-align: center;
    color: var(--muted);
}
.drop-area.dragover { border-color: var(--link); color: var(--fg); }
.preview {
    min-height: 400px;
    max-height: 400px;
    overflow-y: auto;
    border: 1px solid var(--border);
    border-radius: 6px;
    padding: 1rem;
    background: var(--bg);
}
.file-info, .file-stats { font-size: 0.85rem; color: var(--muted); margin-top: 0.75rem; }
.message { margin-top: 0.5rem; font-size: 0.85rem; }
.message.error { color: var(--danger); }
.message.success { color: var(--success); }
.json-preview { font-family: monospace; white-space: pre-wrap; word-break: break-all; font-size: 0.8rem; }

/* Shared view */

.shared-doc {
    max-width: 900px;
    margin: 40px auto;
    background: #23272b;
    border-radius: 12px;
    box-shadow: 0 4px 32px #000a;
    padding: 2.5rem 2rem;
    color: #e0e6eb;
}
"#;
