//! Dashboard listing: category filter, search, sorting and statistics.
//!
//! Filtering and searching are independent predicates over the document
//! list, so applying them in either order gives the same result.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::html::content_word_count;
use crate::models::{Document, SortOrder, ALL_CATEGORIES};

/// Query string of the document list endpoint and the dashboard.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub category: String,
    pub search: String,
    #[serde(deserialize_with = "lenient_sort")]
    pub sort: SortOrder,
}

/// Unknown sort keys fall back to the default order instead of rejecting the request.
fn lenient_sort<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<SortOrder, D::Error> {
    let s = String::deserialize(deserializer)?;
    Ok(SortOrder::parse_or_default(&s))
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORIES.to_string(),
            search: String::new(),
            sort: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub documents: usize,
    pub categories: usize,
    pub words: usize,
}

// ============================================================================
// Predicates
// ============================================================================

pub fn matches_category(doc: &Document, category: &str) -> bool {
    category == ALL_CATEGORIES || doc.category_or_default() == category
}

/// Case-insensitive substring match over name, content and tags.
/// `term_lower` must already be lowercase; an empty term matches everything.
pub fn matches_search(doc: &Document, term_lower: &str) -> bool {
    term_lower.is_empty()
        || doc.name.to_lowercase().contains(term_lower)
        || doc.content.to_lowercase().contains(term_lower)
        || doc.tags.iter().any(|t| t.to_lowercase().contains(term_lower))
}

pub fn filter_by_category(docs: Vec<Document>, category: &str) -> Vec<Document> {
    docs.into_iter()
        .filter(|d| matches_category(d, category))
        .collect()
}

/// Blank terms keep every document; any other term is matched as typed,
/// surrounding spaces included.
pub fn search(docs: Vec<Document>, term: &str) -> Vec<Document> {
    if term.trim().is_empty() {
        return docs;
    }
    let term_lower = term.to_lowercase();
    docs.into_par_iter()
        .filter(|d| matches_search(d, &term_lower))
        .collect()
}

// ============================================================================
// Sorting
// ============================================================================

/// Lowercase with common Latin accents folded, so "Ágil" sorts next to "agil".
fn name_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            c => c,
        })
        .collect()
}

fn compare_names(a: &Document, b: &Document) -> Ordering {
    name_key(&a.name)
        .cmp(&name_key(&b.name))
        .then_with(|| a.name.cmp(&b.name))
}

pub fn sort_documents(docs: &mut [Document], order: SortOrder) {
    match order {
        SortOrder::NameAsc => docs.sort_by(compare_names),
        SortOrder::NameDesc => docs.sort_by(|a, b| compare_names(b, a)),
        SortOrder::LastModifiedAsc => docs.sort_by(|a, b| a.last_modified.cmp(&b.last_modified)),
        SortOrder::LastModifiedDesc => docs.sort_by(|a, b| b.last_modified.cmp(&a.last_modified)),
    }
}

/// Filter, search and sort in one go.
pub fn list(docs: Vec<Document>, query: &ListQuery) -> Vec<Document> {
    let mut docs = search(filter_by_category(docs, &query.category), &query.search);
    sort_documents(&mut docs, query.sort);
    docs
}

// ============================================================================
// Statistics and Grouping
// ============================================================================

/// Dashboard counters for the filtered list. The category count is the
/// number of known categories when showing everything, otherwise 1 when the
/// filtered category has any match.
pub fn stats(filtered: &[Document], category_filter: &str, all_categories: usize) -> Stats {
    let categories = if category_filter == ALL_CATEGORIES {
        all_categories
    } else if filtered.is_empty() {
        0
    } else {
        1
    };
    let words = filtered
        .par_iter()
        .filter(|d| !d.content.trim().is_empty())
        .map(|d| content_word_count(&d.content))
        .sum();

    Stats {
        documents: filtered.len(),
        categories,
        words,
    }
}

/// Sidebar tree: documents per category, categories in order.
pub fn group_by_category(docs: &[Document]) -> BTreeMap<String, Vec<&Document>> {
    let mut groups: BTreeMap<String, Vec<&Document>> = BTreeMap::new();
    for doc in docs {
        groups
            .entry(doc.category_or_default().to_string())
            .or_default()
            .push(doc);
    }
    groups
}
