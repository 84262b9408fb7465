//! Read-only shared view. Only the document body is shown, without any of
//! the app around it.

use super::styles::STYLE;

/// `body` must already be sanitised.
pub fn render_shared(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Visualização do Documento</title>
    <style>{style}</style>
</head>
<body>
    <div class="shared-doc">
        {body}
    </div>
</body>
</html>"#,
        style = STYLE,
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_page_has_no_app_chrome() {
        let page = render_shared("<h1>Oi</h1>");
        assert!(page.contains("<title>Visualização do Documento</title>"));
        assert!(page.contains(r#"<div class="shared-doc">"#));
        assert!(page.contains("<h1>Oi</h1>"));
        assert!(!page.contains("nav-bar\">"));
        assert!(!page.contains("<script"));
    }
}
