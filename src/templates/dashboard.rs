//! Dashboard: statistics, category tabs, search and the document cards.

use chrono::{DateTime, Utc};

use crate::html::{html_escape, html_to_text};
use crate::import::truncate_with_ellipsis;
use crate::listing::{ListQuery, Stats};
use crate::models::{Document, SortOrder, ALL_CATEGORIES};
use crate::routing::{dashboard_query, document_path, editor_query, href};

const EXCERPT_CHARS: usize = 140;

const SORT_OPTIONS: [(SortOrder, &str); 4] = [
    (SortOrder::LastModifiedDesc, "Modificado recentemente"),
    (SortOrder::LastModifiedAsc, "Modificado há mais tempo"),
    (SortOrder::NameAsc, "Nome (A-Z)"),
    (SortOrder::NameDesc, "Nome (Z-A)"),
];

/// Relative age in Portuguese: "3 dias atrás", "agora mesmo".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let years = months / 12;

    let plural = |n: i64, one: &str, many: &str| {
        format!("{} {} atrás", n, if n > 1 { many } else { one })
    };
    if years > 0 {
        plural(years, "ano", "anos")
    } else if months > 0 {
        plural(months, "mês", "meses")
    } else if days > 0 {
        plural(days, "dia", "dias")
    } else if hours > 0 {
        plural(hours, "hora", "horas")
    } else if minutes > 0 {
        plural(minutes, "minuto", "minutos")
    } else {
        "agora mesmo".to_string()
    }
}

fn category_tabs(categories: &[String], listing: &ListQuery) -> String {
    let mut html = String::from(r#"<div class="category-tabs">"#);
    let all = std::iter::once(ALL_CATEGORIES.to_string()).chain(categories.iter().cloned());
    for category in all {
        let target = ListQuery {
            category: category.clone(),
            ..listing.clone()
        };
        let class = if category == listing.category { " class=\"active\"" } else { "" };
        html.push_str(&format!(
            r#"<a href="{}"{}>{}</a>"#,
            html_escape(&href(&dashboard_query(&target))),
            class,
            html_escape(&category)
        ));
    }
    html.push_str("</div>");
    html
}

fn filters(listing: &ListQuery) -> String {
    let options: String = SORT_OPTIONS
        .iter()
        .map(|(order, label)| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                order.as_str(),
                if *order == listing.sort { " selected" } else { "" },
                label
            )
        })
        .collect();

    format!(
        r#"<form class="filters" method="get" action="/">
            <input type="hidden" name="view" value="dashboard">
            <input type="hidden" name="category" value="{category}">
            <input type="search" name="search" placeholder="Buscar documentos..." value="{search}">
            <select name="sort" onchange="this.form.submit()">{options}</select>
            <button type="submit">Buscar</button>
        </form>"#,
        category = html_escape(&listing.category),
        search = html_escape(&listing.search),
        options = options,
    )
}

fn card(doc: &Document, now: DateTime<Utc>) -> String {
    let excerpt = truncate_with_ellipsis(&html_to_text(&doc.content).replace('\n', " "), EXCERPT_CHARS);
    let tags: String = doc
        .tags
        .iter()
        .map(|t| format!(r#"<span class="tag">{}</span>"#, html_escape(t)))
        .collect();
    let open = html_escape(&href(&editor_query(&doc.id)));

    format!(
        r#"<div class="card" data-document-id="{id}">
            <h3><a href="{open}">{name}</a></h3>
            <div class="meta">📁 {category} · 🕒 {age}</div>
            <div class="excerpt">{excerpt}</div>
            <div>{tags}</div>
            <div class="actions">
                <a class="btn" href="{open}">Abrir</a>
                <a class="btn" href="{json}">JSON</a>
                <button class="btn-danger" data-id="{id}" data-name="{name}" onclick="confirmDelete(this)">Excluir</button>
            </div>
        </div>"#,
        id = html_escape(&doc.id),
        json = html_escape(&document_path(&doc.id, &["json"])),
        open = open,
        name = html_escape(&doc.name),
        category = html_escape(doc.category_or_default()),
        age = time_ago(doc.last_modified, now),
        excerpt = html_escape(&excerpt),
        tags = tags,
    )
}

/// Dashboard body. `documents` is already filtered and sorted.
pub fn render_dashboard(
    documents: &[Document],
    stats: &Stats,
    categories: &[String],
    listing: &ListQuery,
    now: DateTime<Utc>,
) -> String {
    let cards = if documents.is_empty() {
        r#"<p class="empty-state">Nenhum documento encontrado.</p>"#.to_string()
    } else {
        let cards: String = documents.iter().map(|d| card(d, now)).collect();
        format!(r#"<div class="cards">{}</div>"#, cards)
    };

    format!(
        r#"<h1>Documentos</h1>
        <div class="stats">
            <div class="stat"><span class="stat-number" id="total-documents">{documents}</span><span class="stat-label">Documentos</span></div>
            <div class="stat"><span class="stat-number" id="total-categories">{categories}</span><span class="stat-label">Categorias</span></div>
            <div class="stat"><span class="stat-number" id="total-words">{words}</span><span class="stat-label">Palavras</span></div>
        </div>
        {tabs}
        {filters}
        {cards}"#,
        documents = stats.documents,
        categories = stats.categories,
        words = stats.words,
        tabs = category_tabs(categories, listing),
        filters = filters(listing),
        cards = cards,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_time_ago() {
        let now = now();
        assert_eq!(time_ago(now, now), "agora mesmo");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minuto atrás");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 horas atrás");
        assert_eq!(time_ago(now - Duration::days(2), now), "2 dias atrás");
        assert_eq!(time_ago(now - Duration::days(65), now), "2 meses atrás");
        assert_eq!(time_ago(now - Duration::days(800), now), "2 anos atrás");
        // clock skew never produces negative ages
        assert_eq!(time_ago(now + Duration::hours(1), now), "agora mesmo");
    }

    #[test]
    fn test_render_dashboard() {
        let doc = Document {
            id: "doc 1".to_string(),
            name: "Ata <final>".to_string(),
            content: "<p>Reunião de pauta</p>".to_string(),
            category: "Trabalho".to_string(),
            tags: vec!["rh".to_string()],
            created: now(),
            last_modified: now() - Duration::days(1),
        };
        let stats = Stats {
            documents: 1,
            categories: 1,
            words: 3,
        };
        let listing = ListQuery {
            category: "Trabalho".to_string(),
            ..ListQuery::default()
        };
        let html = render_dashboard(&[doc], &stats, &["Trabalho".to_string()], &listing, now());
        assert!(html.contains("Ata &lt;final&gt;"));
        assert!(html.contains("1 dia atrás"));
        assert!(html.contains(r#"<span class="tag">rh</span>"#));
        assert!(html.contains("/api/documents/doc%201/json"));
        assert!(html.contains(r#"href="/?view=dashboard">Todos</a>"#));
        assert!(html.contains(r#"class="active">Trabalho</a>"#));
        assert!(html.contains(r#"id="total-words">3<"#));
    }

    #[test]
    fn test_empty_dashboard() {
        let stats = Stats {
            documents: 0,
            categories: 0,
            words: 0,
        };
        let html = render_dashboard(&[], &stats, &[], &ListQuery::default(), now());
        assert!(html.contains("Nenhum documento encontrado."));
        assert!(html.contains(r#"<option value="lastModifiedDesc" selected>"#));
    }
}
