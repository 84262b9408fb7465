//! Docs - a small document editor served over HTTP.
//!
//! The application is organized into the following modules:
//!
//! - `store`: sled-backed documents and preferences
//! - `import`: PDF, Word, HTML, text, Markdown and RTF conversion to HTML
//! - `export`: PDF, DOCX, HTML, TXT, Markdown and JSON downloads
//! - `listing`, `routing`: dashboard filtering and URL view state
//! - `templates`: HTML/CSS/JS rendering
//! - `handlers`: HTTP route handlers

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use docs::{app, AppState, Config};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("docs=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    let bind = config.bind;
    let db_path = config.db_path.clone();

    let state = match AppState::open(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("Failed to open database at {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", bind, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Docs server running at http://{}", bind);
    tracing::info!("Database: {}", db_path.display());

    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("Server error: {}", e);
    }
}
