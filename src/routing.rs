//! URL query routing and share links.
//!
//! The whole UI state lives in the query string: `view`, `doc`, `category`,
//! `search` and `sort`. `view=1&doc=<base64>` is the read-only shared view.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use url::{form_urlencoded, Url};

use crate::error::{DocsError, Result};
use crate::html::sanitize;
use crate::listing::ListQuery;
use crate::models::{SortOrder, View, ALL_CATEGORIES};

/// Body shown when a shared payload cannot be decoded.
pub const SHARE_DECODE_ERROR: &str = "<h2>Erro ao decodificar documento.</h2>";

/// Raw query parameters of `GET /`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteQuery {
    pub view: Option<String>,
    pub doc: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Per-request view state rebuilt from the URL.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub view: View,
    pub document_id: Option<String>,
    pub listing: ListQuery,
}

#[derive(Debug, Clone)]
pub enum Route {
    /// Read-only shared document; carries the raw base64 payload.
    Shared(String),
    App(ViewState),
}

impl RouteQuery {
    fn listing(&self) -> ListQuery {
        ListQuery {
            category: self
                .category
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| ALL_CATEGORIES.to_string()),
            search: self.search.clone().unwrap_or_default(),
            sort: self
                .sort
                .as_deref()
                .map(SortOrder::parse_or_default)
                .unwrap_or_default(),
        }
    }
}

/// Pick the view for a request. `doc_exists` is consulted only for the
/// editor, which falls back to the dashboard when the document is missing.
pub fn resolve(query: &RouteQuery, doc_exists: impl Fn(&str) -> bool) -> Route {
    let doc = query.doc.as_deref().filter(|d| !d.is_empty());

    if query.view.as_deref() == Some("1") {
        if let Some(payload) = doc {
            return Route::Shared(payload.to_string());
        }
    }

    let requested = query
        .view
        .as_deref()
        .and_then(View::parse)
        .unwrap_or_default();

    let (view, document_id) = match requested {
        View::Editor => match doc {
            Some(id) if doc_exists(id) => (View::Editor, Some(id.to_string())),
            Some(id) => {
                tracing::warn!("Editor requested for missing document {}", id);
                (View::Dashboard, None)
            }
            None => (View::Dashboard, None),
        },
        View::Export => (View::Export, doc.map(String::from)),
        other => (other, None),
    };

    Route::App(ViewState {
        view,
        document_id,
        listing: query.listing(),
    })
}

// ============================================================================
// Sharing
// ============================================================================

pub fn encode_share(html: &str) -> String {
    STANDARD.encode(html.as_bytes())
}

/// Decode a shared payload into sanitised HTML.
///
/// Form decoding turns `+` into a space, so spaces are put back first.
pub fn decode_share(payload: &str) -> Result<String> {
    let cleaned: String = payload
        .trim()
        .chars()
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| DocsError::InvalidInput(format!("Invalid share payload: {}", e)))?;
    let html = String::from_utf8(bytes)
        .map_err(|e| DocsError::InvalidInput(format!("Invalid share payload: {}", e)))?;
    Ok(sanitize(&html))
}

/// What the shared view displays: the document, or the decode error banner.
pub fn shared_body(payload: &str) -> String {
    match decode_share(payload) {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!("{}", e);
            SHARE_DECODE_ERROR.to_string()
        }
    }
}

// ============================================================================
// Link Building
// ============================================================================

fn encode_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

pub fn share_query(html: &str) -> String {
    let encoded = encode_share(html);
    encode_pairs([("view", "1"), ("doc", encoded.as_str())])
}

pub fn editor_query(id: &str) -> String {
    encode_pairs([("view", View::Editor.as_str()), ("doc", id)])
}

pub fn view_query(view: View) -> String {
    encode_pairs([("view", view.as_str())])
}

pub fn export_query(id: &str) -> String {
    encode_pairs([("view", View::Export.as_str()), ("doc", id)])
}

/// Dashboard query; the "all categories" filter, an empty search and the
/// default sort are left out.
pub fn dashboard_query(listing: &ListQuery) -> String {
    let mut pairs = vec![("view", View::Dashboard.as_str())];
    if listing.category != ALL_CATEGORIES && !listing.category.is_empty() {
        pairs.push(("category", listing.category.as_str()));
    }
    if !listing.search.trim().is_empty() {
        pairs.push(("search", listing.search.as_str()));
    }
    if listing.sort != SortOrder::default() {
        pairs.push(("sort", listing.sort.as_str()));
    }
    encode_pairs(pairs)
}

/// `/api/documents/<id>/<tail...>` with the id percent-encoded as a path segment.
pub fn document_path(id: &str, tail: &[&str]) -> String {
    let mut url = match Url::parse("http://localhost/api/documents") {
        Ok(url) => url,
        Err(_) => return format!("/api/documents/{}", id),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(id).extend(tail);
    }
    url.path().to_string()
}

/// Relative link for use inside rendered pages.
pub fn href(query: &str) -> String {
    format!("/?{}", query)
}

/// Base URL for absolute links: the configured one, else built from the
/// request's Host header.
pub fn base_url(configured: Option<&str>, host: Option<&str>) -> Result<Url> {
    let raw = match (configured, host) {
        (Some(base), _) => base.to_string(),
        (None, Some(host)) => format!("http://{}/", host),
        (None, None) => format!("http://{}/", crate::config::DEFAULT_BIND),
    };
    Url::parse(&raw).map_err(|e| DocsError::InvalidInput(format!("Invalid base URL {:?}: {}", raw, e)))
}

pub fn absolute(base: &Url, query: &str) -> Url {
    let mut url = base.clone();
    url.set_fragment(None);
    url.set_query(Some(query));
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> RouteQuery {
        let encoded = encode_pairs(pairs.iter().copied());
        serde_urlencoded_like(&encoded)
    }

    // Parse the way axum's Query extractor does.
    fn serde_urlencoded_like(encoded: &str) -> RouteQuery {
        let mut q = RouteQuery::default();
        for (k, v) in form_urlencoded::parse(encoded.as_bytes()) {
            let v = Some(v.into_owned());
            match k.as_ref() {
                "view" => q.view = v,
                "doc" => q.doc = v,
                "category" => q.category = v,
                "search" => q.search = v,
                "sort" => q.sort = v,
                _ => {}
            }
        }
        q
    }

    fn app(route: Route) -> ViewState {
        match route {
            Route::App(state) => state,
            Route::Shared(_) => panic!("expected an app view"),
        }
    }

    #[test]
    fn test_default_is_dashboard() {
        let state = app(resolve(&RouteQuery::default(), |_| true));
        assert_eq!(state.view, View::Dashboard);
        assert_eq!(state.listing.category, ALL_CATEGORIES);
        assert_eq!(state.listing.sort, SortOrder::LastModifiedDesc);

        let unknown = app(resolve(&query(&[("view", "bogus")]), |_| true));
        assert_eq!(unknown.view, View::Dashboard);
    }

    #[test]
    fn test_editor_requires_existing_document() {
        let ok = app(resolve(&query(&[("view", "editor"), ("doc", "a")]), |id| id == "a"));
        assert_eq!(ok.view, View::Editor);
        assert_eq!(ok.document_id.as_deref(), Some("a"));

        let missing = app(resolve(&query(&[("view", "editor"), ("doc", "b")]), |id| id == "a"));
        assert_eq!(missing.view, View::Dashboard);

        let none = app(resolve(&query(&[("view", "editor")]), |_| true));
        assert_eq!(none.view, View::Dashboard);
    }

    #[test]
    fn test_shared_view_wins() {
        match resolve(&query(&[("view", "1"), ("doc", "PGI+")]), |_| false) {
            Route::Shared(payload) => assert_eq!(payload, "PGI+"),
            Route::App(_) => panic!("expected shared view"),
        }
        // view=1 without a payload is just an unknown view
        assert_eq!(app(resolve(&query(&[("view", "1")]), |_| true)).view, View::Dashboard);
    }

    #[test]
    fn test_share_link_round_trip() {
        let html = "<h1>Olá, mundo</h1><p>ação &amp; reação ~?+/</p>";
        let q = serde_urlencoded_like(&share_query(html));
        assert_eq!(q.view.as_deref(), Some("1"));
        assert_eq!(decode_share(q.doc.as_deref().unwrap()).unwrap(), sanitize(html));
    }

    #[test]
    fn test_plus_turned_space_still_decodes() {
        // "<b>?>" encodes with a '+' in the payload
        let encoded = encode_share("<b>?></b>");
        assert!(encoded.contains('+') || encoded.contains('/'));
        let mangled = encoded.replace('+', " ");
        assert_eq!(decode_share(&mangled).unwrap(), decode_share(&encoded).unwrap());
    }

    #[test]
    fn test_shared_body_sanitises_and_reports_errors() {
        let body = shared_body(&encode_share("<p>ok</p><script>alert(1)</script>"));
        assert!(body.contains("<p>ok</p>"));
        assert!(!body.contains("script"));
        assert_eq!(shared_body("%%%not base64"), SHARE_DECODE_ERROR);
    }

    #[test]
    fn test_dashboard_query_omits_defaults() {
        assert_eq!(dashboard_query(&ListQuery::default()), "view=dashboard");
        let listing = ListQuery {
            category: "Trabalho".to_string(),
            search: " ata ".to_string(),
            sort: SortOrder::NameAsc,
        };
        assert_eq!(
            dashboard_query(&listing),
            "view=dashboard&category=Trabalho&search=+ata+&sort=nameAsc"
        );
        let blank = ListQuery {
            search: "   ".to_string(),
            ..ListQuery::default()
        };
        assert_eq!(dashboard_query(&blank), "view=dashboard");
    }

    #[test]
    fn test_document_path_encodes_id() {
        assert_eq!(document_path("doc-1", &[]), "/api/documents/doc-1");
        assert_eq!(document_path("a b/c", &["export", "pdf"]), "/api/documents/a%20b%2Fc/export/pdf");
    }

    #[test]
    fn test_absolute_links() {
        let base = base_url(None, Some("localhost:3000")).unwrap();
        assert_eq!(
            absolute(&base, &editor_query("doc-1")).as_str(),
            "http://localhost:3000/?view=editor&doc=doc-1"
        );
        let configured = base_url(Some("https://docs.example.com/app"), Some("ignored")).unwrap();
        assert!(absolute(&configured, &share_query("<p>x</p>"))
            .as_str()
            .starts_with("https://docs.example.com/app?view=1&doc="));
        assert!(base_url(Some("not a url"), None).is_err());
    }
}
