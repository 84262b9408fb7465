//! Data models for the docs application.
//!
//! Document records keep the exact JSON shape the editor has always written
//! (camelCase keys, ISO-8601 timestamps with millisecond precision), so
//! backups produced by older versions import unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned to documents that have none.
pub const UNCATEGORIZED: &str = "Sem Categoria";

/// Category filter value meaning "every category".
pub const ALL_CATEGORIES: &str = "Todos";

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(with = "iso8601")]
    pub created: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub last_modified: DateTime<Utc>,
}

impl Document {
    /// Category used for filtering and grouping; empty counts as uncategorized.
    pub fn category_or_default(&self) -> &str {
        if self.category.trim().is_empty() {
            UNCATEGORIZED
        } else {
            &self.category
        }
    }
}

/// Lenient view of a document record.
///
/// Everything is optional: it is used both for reading possibly old or
/// hand-edited store entries and for documents pasted in as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl DocumentData {
    /// Fill in defaults for a stored record. `created` falls back to
    /// `lastModified`, which falls back to `now`.
    pub fn into_document(self, id: String, now: DateTime<Utc>) -> Document {
        let last_modified = self
            .last_modified
            .as_deref()
            .and_then(iso8601::parse)
            .unwrap_or(now);
        let created = self
            .created
            .as_deref()
            .and_then(iso8601::parse)
            .unwrap_or(last_modified);

        Document {
            id,
            name: self.name.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            tags: self.tags.unwrap_or_default(),
            created,
            last_modified,
        }
    }
}

/// Body for creating a document from the dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDocumentRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: TagsInput,
}

/// Body for saving editor content. Omitted fields keep their stored value.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveDocumentRequest {
    pub content: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub tags: Option<TagsInput>,
}

/// Body for the document properties dialog.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertiesRequest {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: TagsInput,
}

/// Tags arrive either as a JSON array or as the comma-separated text typed
/// into the properties form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(Vec::new())
    }
}

impl TagsInput {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            TagsInput::Text(text) => parse_tags(&text),
        }
    }
}

/// Split a comma-separated tag list, trimming and dropping empties.
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

// ============================================================================
// Views and Sorting
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Editor,
    Settings,
    Import,
    Export,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Editor => "editor",
            View::Settings => "settings",
            View::Import => "import",
            View::Export => "export",
        }
    }

    pub fn parse(s: &str) -> Option<View> {
        match s {
            "dashboard" => Some(View::Dashboard),
            "editor" => Some(View::Editor),
            "settings" => Some(View::Settings),
            "import" => Some(View::Import),
            "export" => Some(View::Export),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    NameAsc,
    NameDesc,
    LastModifiedAsc,
    #[default]
    LastModifiedDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::NameAsc => "nameAsc",
            SortOrder::NameDesc => "nameDesc",
            SortOrder::LastModifiedAsc => "lastModifiedAsc",
            SortOrder::LastModifiedDesc => "lastModifiedDesc",
        }
    }

    /// Unknown values fall back to the default order, like the sort select did.
    pub fn parse_or_default(s: &str) -> SortOrder {
        match s {
            "nameAsc" => SortOrder::NameAsc,
            "nameDesc" => SortOrder::NameDesc,
            "lastModifiedAsc" => SortOrder::LastModifiedAsc,
            _ => SortOrder::LastModifiedDesc,
        }
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// The handful of UI flags that survive a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub auto_save_enabled: bool,
    pub sidebar_visible: bool,
    pub last_view: View,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_save_enabled: true,
            sidebar_visible: true,
            last_view: View::Dashboard,
        }
    }
}

/// Partial update for preferences.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub auto_save_enabled: Option<bool>,
    pub sidebar_visible: Option<bool>,
    pub last_view: Option<View>,
}

// ============================================================================
// Timestamps
// ============================================================================

/// ISO-8601 with millisecond precision and a `Z` suffix, matching
/// `Date.prototype.toISOString`.
pub mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_document_json_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 7, 20, 12, 30, 0).unwrap();
        let doc = Document {
            id: "doc-1".to_string(),
            name: "Ata".to_string(),
            content: "<p>x</p>".to_string(),
            category: "Fluxos".to_string(),
            tags: vec!["a".to_string()],
            created: ts,
            last_modified: ts,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["lastModified"], "2024-07-20T12:30:00.000Z");
        assert_eq!(json["created"], "2024-07-20T12:30:00.000Z");
        assert!(json.get("last_modified").is_none());

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_document_data_defaults() {
        let now = Utc::now();
        let data: DocumentData = serde_json::from_str(r#"{"name": "Old"}"#).unwrap();
        let doc = data.into_document("doc-x".to_string(), now);
        assert_eq!(doc.category, UNCATEGORIZED);
        assert!(doc.tags.is_empty());
        assert_eq!(doc.content, "");
        assert_eq!(doc.created, now);
        assert_eq!(doc.last_modified, now);
    }

    #[test]
    fn test_created_falls_back_to_last_modified() {
        let data: DocumentData =
            serde_json::from_str(r#"{"lastModified": "2023-01-02T03:04:05.000Z"}"#).unwrap();
        let doc = data.into_document("d".to_string(), Utc::now());
        assert_eq!(doc.created, doc.last_modified);
        assert_eq!(iso8601::format(&doc.created), "2023-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_tags_input_variants() {
        let text: TagsInput = serde_json::from_str(r#"" rh , integracao,, ""#).unwrap();
        assert_eq!(text.into_tags(), vec!["rh", "integracao"]);
        let list: TagsInput = serde_json::from_str(r#"["a", " ", "b "]"#).unwrap();
        assert_eq!(list.into_tags(), vec!["a", "b"]);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse_or_default("nameAsc"), SortOrder::NameAsc);
        assert_eq!(SortOrder::parse_or_default("bogus"), SortOrder::LastModifiedDesc);
        assert_eq!(SortOrder::NameDesc.as_str(), "nameDesc");
    }

    #[test]
    fn test_view_round_trip() {
        for view in [View::Dashboard, View::Editor, View::Settings, View::Import, View::Export] {
            assert_eq!(View::parse(view.as_str()), Some(view));
        }
        assert_eq!(View::parse("1"), None);
    }
}
