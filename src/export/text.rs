//! Plain text and Markdown exports.

use crate::html::{html_to_markdown, html_to_text};

/// Title, a `=` underline of the same width, then the document text.
pub fn to_txt(title: &str, content: &str) -> String {
    format!(
        "{}\n{}\n\n{}\n",
        title,
        "=".repeat(title.chars().count()),
        html_to_text(content)
    )
}

pub fn to_markdown(title: &str, content: &str) -> String {
    format!("# {}\n\n{}\n", title, html_to_markdown(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_layout() {
        let txt = to_txt("Ação", "<h2>Parte</h2><p>Texto &amp; mais</p>");
        assert_eq!(txt, "Ação\n====\n\nParte\n\nTexto & mais\n");
    }

    #[test]
    fn test_markdown_layout() {
        let md = to_markdown("Notas", "<p><em>oi</em></p><blockquote>citação</blockquote>");
        assert_eq!(md, "# Notas\n\n*oi*\n\n> citação\n");
    }
}
