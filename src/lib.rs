//! Docs library: document store, import/export conversions and the web app.
//!
//! Everything is public so the integration tests can drive the router and
//! the conversions directly.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod html;
pub mod import;
pub mod listing;
pub mod models;
pub mod routing;
pub mod store;
pub mod templates;

pub use config::Config;
pub use error::{DocsError, ExportError, ImportError, Result};
pub use export::{export_document, ExportFile, ExportFormat, ExportOptions};
pub use import::{process_file, FileKind, ImportOptions, ImportResult, Upload};
pub use models::{Document, DocumentData, Preferences, SortOrder, View};
pub use store::DocumentStore;

/// Headroom above the import cap so oversized files reach validation and
/// get its message instead of a bare 413.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

// ============================================================================
// Application State
// ============================================================================

pub struct AppState {
    pub store: DocumentStore,
    pub config: Config,
}

impl AppState {
    pub fn new(store: DocumentStore, config: Config) -> Self {
        Self { store, config }
    }

    /// Open the sled database at `config.db_path`, seeding the sample
    /// documents when asked to.
    pub fn open(config: Config) -> Result<Self> {
        let db = sled::open(&config.db_path)?;
        let store = DocumentStore::new(db);
        if config.seed_defaults {
            store.ensure_default_documents()?;
        }
        Ok(Self::new(store, config))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = (state.config.max_import_bytes as usize)
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // Views
        .route("/", get(handlers::index))
        // Documents
        .route(
            "/api/documents",
            get(handlers::list_documents)
                .post(handlers::create_document)
                .delete(handlers::clear_documents),
        )
        .route(
            "/api/documents/{id}",
            get(handlers::get_document)
                .put(handlers::save_document)
                .delete(handlers::delete_document),
        )
        .route("/api/documents/{id}/properties", put(handlers::update_properties))
        .route("/api/documents/{id}/json", get(handlers::document_json))
        .route("/api/documents/{id}/share", get(handlers::share_link))
        .route("/api/documents/{id}/export/{format}", get(handlers::export_document))
        .route("/api/categories", get(handlers::categories))
        .route("/api/stats", get(handlers::stats))
        // Import / export
        .route("/api/import/preview", post(handlers::import_preview))
        .route("/api/import/file", post(handlers::import_file))
        .route("/api/import/json", post(handlers::import_json))
        .route("/api/import/backup", post(handlers::import_backup))
        .route("/api/export/all", get(handlers::export_all))
        // Settings
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
