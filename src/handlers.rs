//! HTTP route handlers.
//!
//! `GET /` renders whichever view the query string selects; everything under
//! `/api` is JSON except the downloads, which carry a `Content-Disposition`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use url::form_urlencoded;

use crate::error::{DocsError, ImportError, Result};
use crate::export::{self, ExportFile, ExportFormat, ExportOptions};
use crate::import::{self, ImportOptions, ImportResult, Upload};
use crate::listing::{self, ListQuery, Stats};
use crate::models::{
    parse_tags, Document, DocumentData, NewDocumentRequest, Preferences, PreferencesUpdate,
    PropertiesRequest, SaveDocumentRequest, View,
};
use crate::routing::{self, Route, RouteQuery};
use crate::templates::{
    base_html, render_dashboard, render_editor, render_export, render_import, render_settings,
    render_shared, Layout,
};
use crate::AppState;

// ============================================================================
// Index Handler
// ============================================================================

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RouteQuery>,
) -> Result<Html<String>> {
    let store = &state.store;
    let route = routing::resolve(&query, |id| {
        matches!(store.load_document(id), Ok(Some(_)))
    });

    let view_state = match route {
        Route::Shared(payload) => {
            return Ok(Html(render_shared(&routing::shared_body(&payload))));
        }
        Route::App(view_state) => view_state,
    };

    store.set_last_view(view_state.view)?;
    let documents = store.list_documents()?;
    let preferences = store.preferences()?;
    let mut current: Option<Document> = None;

    let (title, content, script) = match view_state.view {
        View::Dashboard => {
            let categories = store.all_categories()?;
            let listed = listing::list(documents.clone(), &view_state.listing);
            let stats = listing::stats(&listed, &view_state.listing.category, categories.len());
            let content = render_dashboard(&listed, &stats, &categories, &view_state.listing, Utc::now());
            ("Meus Documentos".to_string(), content, String::new())
        }
        View::Editor => {
            let id = view_state.document_id.as_deref().unwrap_or_default();
            let doc = store
                .load_document(id)?
                .ok_or_else(|| DocsError::NotFound(id.to_string()))?;
            store.set_last_opened(Some(&doc.id))?;
            let categories = store.all_categories()?;
            let (content, script) = render_editor(&doc, &categories);
            let title = doc.name.clone();
            current = Some(doc);
            (title, content, script)
        }
        View::Export => {
            let id = match view_state.document_id {
                Some(id) => Some(id),
                None => store.last_opened()?,
            };
            current = match id {
                Some(id) => store.load_document(&id)?,
                None => None,
            };
            let (content, script) = render_export(current.as_ref(), &documents);
            ("Exportar Documento".to_string(), content, script)
        }
        View::Import => {
            let categories = store.all_categories()?;
            let (content, script) = render_import(&categories, state.config.max_import_bytes);
            ("Importar Documento".to_string(), content, script)
        }
        View::Settings => {
            let (content, script) = render_settings(&preferences, documents.len());
            ("Configurações".to_string(), content, script)
        }
    };

    let layout = Layout {
        title: &title,
        view: view_state.view,
        documents: &documents,
        current_id: current.as_ref().map(|d| d.id.as_str()),
        preferences: &preferences,
    };
    Ok(Html(base_html(&layout, &content, &script)))
}

// ============================================================================
// Documents API
// ============================================================================

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Document>>> {
    let docs = state.store.list_documents()?;
    Ok(Json(listing::list(docs, &query)))
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewDocumentRequest>,
) -> Result<(StatusCode, Json<Document>)> {
    let doc = state
        .store
        .create_document(req.name, req.category, req.tags.into_tags())?;
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn clear_documents(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let deleted = state.store.clear_all_documents()?;
    Ok(Json(json!({ "deleted": deleted })))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    load(&state, &id).map(Json)
}

pub async fn save_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SaveDocumentRequest>,
) -> Result<Json<Document>> {
    let doc = state.store.save_document(
        &id,
        &req.content,
        req.name,
        req.category,
        req.tags.map(|t| t.into_tags()),
    )?;
    Ok(Json(doc))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    if state.store.delete_document(&id)? {
        Ok(Json(json!({ "deleted": true })))
    } else {
        Err(DocsError::NotFound(id))
    }
}

pub async fn update_properties(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PropertiesRequest>,
) -> Result<Json<Document>> {
    let doc = state
        .store
        .update_properties(&id, &req.name, &req.category, req.tags.into_tags())?;
    Ok(Json(doc))
}

/// Read-only share link carrying the document body in the URL.
pub async fn share_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let doc = load(&state, &id)?;
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    let base = routing::base_url(state.config.base_url.as_deref(), host)?;
    let query = routing::share_query(&doc.content);
    Ok(Json(json!({
        "url": routing::absolute(&base, &query).to_string(),
        "editorUrl": routing::absolute(&base, &routing::editor_query(&doc.id)).to_string(),
    })))
}

pub async fn categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.store.all_categories()?))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Stats>> {
    let categories = state.store.all_categories()?;
    let listed = listing::list(state.store.list_documents()?, &query);
    Ok(Json(listing::stats(&listed, &query.category, categories.len())))
}

fn load(state: &AppState, id: &str) -> Result<Document> {
    state
        .store
        .load_document(id)?
        .ok_or_else(|| DocsError::NotFound(id.to_string()))
}

// ============================================================================
// Downloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// `false` serves the file inline, for the export preview.
    #[serde(default = "default_download")]
    pub download: bool,
}

fn default_download() -> bool {
    true
}

/// `Content-Disposition` with an ASCII `filename` and the exact UTF-8 name
/// in `filename*`.
pub fn content_disposition(disposition: &str, filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() && c != '"' { c } else { '_' })
        .collect();
    let encoded = form_urlencoded::byte_serialize(filename.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition, ascii, encoded
    )
}

fn download(file: ExportFile, inline: bool) -> Response {
    let disposition = content_disposition(if inline { "inline" } else { "attachment" }, &file.filename);
    let mut headers = vec![
        (header::CONTENT_TYPE, file.content_type.to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    if file.fallback {
        headers.push((header::HeaderName::from_static("x-export-fallback"), "true".to_string()));
    }
    let mut response = file.bytes.into_response();
    for (name, value) in headers {
        if let Ok(value) = header::HeaderValue::from_str(&value) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

pub async fn export_document(
    State(state): State<Arc<AppState>>,
    Path((id, format)): Path<(String, String)>,
    Query(options): Query<ExportOptions>,
    Query(flags): Query<DownloadQuery>,
) -> Result<Response> {
    let format = ExportFormat::parse(&format)?;
    let doc = load(&state, &id)?;
    let file = tokio::task::spawn_blocking(move || {
        export::export_document(&doc, format, &options, Utc::now())
    })
    .await??;
    Ok(download(file, !flags.download))
}

pub async fn document_json(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    let doc = load(&state, &id)?;
    let file = export::document_json(&doc, Utc::now())?;
    Ok(download(file, false))
}

pub async fn export_all(State(state): State<Arc<AppState>>) -> Result<Response> {
    let records = state.store.all_documents()?;
    let file = export::backup_json(&records)?;
    tracing::info!("Exported backup of {} documents", records.len());
    Ok(download(file, false))
}

// ============================================================================
// Import API
// ============================================================================

/// Split a multipart form into the uploaded file and the plain text fields.
async fn read_upload(mut multipart: Multipart) -> Result<(Option<Upload>, HashMap<String, String>)> {
    let mut upload = None;
    let mut fields = HashMap::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(ImportError::Multipart(e.to_string()).into()),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("arquivo").to_string();
            let mime = field.content_type().map(|m| m.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ImportError::Multipart(e.to_string()))?;
            upload = Some(Upload {
                filename,
                mime,
                bytes: bytes.to_vec(),
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ImportError::Multipart(e.to_string()))?;
            fields.insert(name, text);
        }
    }

    Ok((upload, fields))
}

async fn process_upload(state: &AppState, multipart: Multipart) -> Result<(ImportResult, HashMap<String, String>)> {
    let (upload, fields) = read_upload(multipart).await?;
    let upload = upload.ok_or_else(|| {
        ImportError::Validation(vec![import::NO_FILE_SELECTED.to_string()])
    })?;
    let options = ImportOptions::from_fields(&fields);
    let max_bytes = state.config.max_import_bytes;
    let result =
        tokio::task::spawn_blocking(move || import::process_file(&upload, &options, max_bytes))
            .await??;
    Ok((result, fields))
}

/// Process an upload and return the converted content without storing it.
pub async fn import_preview(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ImportResult>> {
    let (result, _) = process_upload(&state, multipart).await?;
    Ok(Json(result))
}

/// Process an upload and store it as a new document.
pub async fn import_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ImportResult>> {
    let (mut result, fields) = process_upload(&state, multipart).await?;
    let file = match (&result.file, result.success) {
        (Some(file), true) => file,
        _ => return Ok(Json(result)),
    };

    let data = DocumentData {
        name: Some(file.title.clone()),
        content: Some(file.content.clone()),
        category: fields.get("category").map(|c| c.trim().to_string()),
        tags: fields.get("tags").map(|t| parse_tags(t)),
        ..DocumentData::default()
    };
    let doc = state.store.import_document(data)?;
    state.store.set_last_opened(Some(&doc.id))?;
    result.document_id = Some(doc.id);
    Ok(Json(result))
}

/// Import one document pasted as JSON. It always gets a fresh id.
pub async fn import_json(
    State(state): State<Arc<AppState>>,
    Json(value): Json<Value>,
) -> Result<(StatusCode, Json<Document>)> {
    if !value.is_object() {
        return Err(DocsError::InvalidInput(
            "O JSON deve ser um objeto de documento".to_string(),
        ));
    }
    let data: DocumentData = serde_json::from_value(value)?;
    let doc = state.store.import_document(data)?;
    state.store.set_last_opened(Some(&doc.id))?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// Import a backup made by `/api/export/all`. Unreadable entries are
/// skipped and counted.
pub async fn import_backup(
    State(state): State<Arc<AppState>>,
    Json(value): Json<Value>,
) -> Result<Json<Value>> {
    let records = match value {
        Value::Array(records) => records,
        _ => {
            return Err(DocsError::InvalidInput(
                "O backup deve conter uma lista de documentos".to_string(),
            ))
        }
    };

    let mut imported = 0;
    let mut skipped = 0;
    for record in records {
        match serde_json::from_value::<DocumentData>(record) {
            Ok(data) => {
                state.store.import_document(data)?;
                imported += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable backup entry: {}", e);
                skipped += 1;
            }
        }
    }
    tracing::info!("Imported backup: {} documents, {} skipped", imported, skipped);
    Ok(Json(json!({ "imported": imported, "skipped": skipped })))
}

// ============================================================================
// Settings API
// ============================================================================

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Preferences>> {
    Ok(Json(state.store.preferences()?))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<Preferences>> {
    Ok(Json(state.store.update_preferences(update)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("attachment", "notes.txt"),
            "attachment; filename=\"notes.txt\"; filename*=UTF-8''notes.txt"
        );
    }

    #[test]
    fn test_content_disposition_utf8_name() {
        let value = content_disposition("inline", "Relatório final.json");
        assert!(value.starts_with("inline; filename=\"Relat_rio final.json\""));
        assert!(value.ends_with("filename*=UTF-8''Relat%C3%B3rio%20final.json"));
    }

    #[test]
    fn test_download_marks_fallback() {
        let file = ExportFile {
            filename: "a_para_PDF.html".to_string(),
            content_type: "text/html",
            bytes: b"<html></html>".to_vec(),
            fallback: true,
        };
        let response = download(file, false);
        assert_eq!(response.headers()["x-export-fallback"], "true");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    }

    #[test]
    fn test_failed_docx_download_is_flagged() {
        let now = Utc::now();
        let document = Document {
            id: "doc-1".to_string(),
            name: "Ata".to_string(),
            content: "<p>Pauta</p>".to_string(),
            category: "Geral".to_string(),
            tags: Vec::new(),
            created: now,
            last_modified: now,
        };
        let file = crate::export::export_with(
            &document,
            ExportFormat::Docx,
            &ExportOptions::default(),
            now,
            |_, _, _| Err(crate::ExportError::Docx("broken".into())),
        )
        .unwrap();

        let response = download(file, false);
        assert_eq!(response.headers()["x-export-fallback"], "true");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("Ata_para_Word.html"));
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }
}
