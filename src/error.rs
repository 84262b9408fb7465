//! Error types.
//!
//! `DocsError` is what handlers return; it renders as a JSON `{"error": ...}`
//! body with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::import::FileKind;

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Invalid document data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ImportError {
    /// Every problem found while validating an upload, in discovery order.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Tipo de arquivo não suportado: {0}")]
    Unsupported(String),

    #[error("Erro ao processar arquivo {kind}: {message}")]
    Processor { kind: FileKind, message: String },

    #[error("Invalid multipart upload: {0}")]
    Multipart(String),
}

impl ImportError {
    pub fn processor(kind: FileKind, message: impl Into<String>) -> Self {
        ImportError::Processor {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("DOCX generation failed: {0}")]
    Docx(String),
}

impl DocsError {
    pub fn status(&self) -> StatusCode {
        match self {
            DocsError::NotFound(_) => StatusCode::NOT_FOUND,
            DocsError::InvalidInput(_) | DocsError::Serialization(_) => StatusCode::BAD_REQUEST,
            DocsError::Import(ImportError::Validation(errors))
                if errors.iter().any(|e| e.starts_with("Arquivo muito grande")) =>
            {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            DocsError::Import(ImportError::Processor { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            DocsError::Import(_) => StatusCode::BAD_REQUEST,
            DocsError::Export(ExportError::UnsupportedFormat(_))
            | DocsError::Export(ExportError::InvalidColor(_)) => StatusCode::BAD_REQUEST,
            DocsError::Export(_) | DocsError::Storage(_) | DocsError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DocsError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Request failed ({}): {}", status, self);
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub type Result<T, E = DocsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_joins_errors() {
        let err = ImportError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "a, b");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DocsError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            DocsError::InvalidInput("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        let too_big = DocsError::Import(ImportError::Validation(vec![
            "Arquivo muito grande. Tamanho máximo: 10.0 MB".to_string(),
        ]));
        assert_eq!(too_big.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let failed = DocsError::Import(ImportError::processor(FileKind::Pdf, "broken"));
        assert_eq!(failed.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_processor_message_names_kind() {
        let err = ImportError::processor(FileKind::Rtf, "bad header");
        assert_eq!(err.to_string(), "Erro ao processar arquivo RTF: bad header");
    }
}
