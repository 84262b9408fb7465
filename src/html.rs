//! HTML handling shared by importers, exporters and the views.
//!
//! A small forgiving parser builds a node tree from fragment HTML, which is
//! enough to walk editor content for text extraction and format conversion.
//! Sanitising is left to ammonia.

// ============================================================================
// Node Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    /// Concatenated text of all descendants, like DOM `textContent`.
    pub fn text(&self) -> String {
        text_content(&self.children)
    }

    pub fn heading_level(&self) -> Option<usize> {
        heading_level(&self.tag)
    }
}

pub fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements whose opening implicitly closes an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "p", "div", "ul", "ol", "table", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5", "h6",
    "hr", "section", "article", "header", "footer", "nav", "aside",
];

pub const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "blockquote", "pre",
    "table", "tr", "section", "article", "header", "footer", "hr",
];

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse an HTML fragment (or whole document) into a node tree.
///
/// Never fails: stray end tags are dropped, unclosed elements are closed at
/// the end, comments and doctypes are skipped.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let lower = html.to_ascii_lowercase();
    let bytes = html.as_bytes();
    let len = html.len();
    let mut stack: Vec<Element> = vec![Element::new("#root")];
    let mut i = 0;

    while i < len {
        if bytes[i] == b'<' {
            let rest = &html[i..];
            if rest.starts_with("<!--") {
                i = match html[i + 4..].find("-->") {
                    Some(end) => i + 4 + end + 3,
                    None => len,
                };
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                i = skip_past(html, i, '>');
                continue;
            }
            if rest.starts_with("</") {
                let name_end = scan_name(bytes, i + 2);
                if name_end > i + 2 {
                    let name = lower[i + 2..name_end].to_string();
                    close_element(&mut stack, &name);
                    i = skip_past(html, name_end, '>');
                    continue;
                }
            } else if bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
                let name_end = scan_name(bytes, i + 1);
                let name = lower[i + 1..name_end].to_string();
                let (attrs, self_closing, after) = parse_attrs(html, &lower, name_end);
                i = after;

                open_implied_closes(&mut stack, &name);
                let mut el = Element::new(&name);
                el.attrs = attrs;

                if RAW_TEXT_TAGS.contains(&name.as_str()) && !self_closing {
                    let close = format!("</{}", name);
                    let end = lower[i..].find(&close).map(|p| i + p).unwrap_or(len);
                    let raw = &html[i..end];
                    if !raw.is_empty() {
                        let text = if name == "script" || name == "style" {
                            raw.to_string()
                        } else {
                            decode_entities(raw)
                        };
                        el.children.push(Node::Text(text));
                    }
                    push_child(&mut stack, Node::Element(el));
                    i = if end < len { skip_past(html, end, '>') } else { len };
                } else if is_void(&name) || self_closing {
                    push_child(&mut stack, Node::Element(el));
                } else {
                    stack.push(el);
                }
                continue;
            }
        }

        // Text run up to the next '<' that is not the current byte.
        let next = html[i + 1..].find('<').map(|p| i + 1 + p).unwrap_or(len);
        let text = decode_entities(&html[i..next]);
        push_child(&mut stack, Node::Text(text));
        i = next;
    }

    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut j = start;
    while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'-' || bytes[j] == b':') {
        j += 1;
    }
    j
}

fn skip_past(html: &str, from: usize, ch: char) -> usize {
    match html[from..].find(ch) {
        Some(p) => from + p + 1,
        None => html.len(),
    }
}

/// Returns (attributes, self-closing, index after '>').
fn parse_attrs(html: &str, lower: &str, mut i: usize) -> (Vec<(String, String)>, bool, usize) {
    let bytes = html.as_bytes();
    let len = html.len();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            return (attrs, self_closing, len);
        }
        match bytes[i] {
            b'>' => return (attrs, self_closing, i + 1),
            b'/' => {
                self_closing = true;
                i += 1;
                continue;
            }
            _ => {}
        }
        self_closing = false;

        let name_start = i;
        while i < len && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        if i == name_start {
            i += 1;
            continue;
        }
        let name = lower[name_start..i].to_string();

        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < len && bytes[i] == b'=' {
            i += 1;
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < len && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i] as char;
                let end = html[i + 1..].find(quote).map(|p| i + 1 + p).unwrap_or(len);
                value = decode_entities(&html[i + 1..end]);
                i = (end + 1).min(len);
            } else {
                let start = i;
                while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = decode_entities(&html[start..i]);
            }
        }
        attrs.push((name, value));
    }
}

fn push_child(stack: &mut [Element], node: Node) {
    if let Some(top) = stack.last_mut() {
        // Merge adjacent text so consumers see one run.
        if let (Node::Text(new), Some(Node::Text(prev))) = (&node, top.children.last_mut()) {
            prev.push_str(new);
            return;
        }
        top.children.push(node);
    }
}

fn pop_into_parent(stack: &mut Vec<Element>) {
    if stack.len() <= 1 {
        return;
    }
    if let Some(el) = stack.pop() {
        push_child(stack, Node::Element(el));
    }
}

fn close_element(stack: &mut Vec<Element>, name: &str) {
    if let Some(pos) = stack.iter().rposition(|e| e.tag == name) {
        if pos == 0 {
            return;
        }
        while stack.len() > pos {
            pop_into_parent(stack);
        }
    }
}

fn open_implied_closes(stack: &mut Vec<Element>, name: &str) {
    if CLOSES_PARAGRAPH.contains(&name) {
        if let Some(top) = stack.last() {
            if top.tag == "p" {
                pop_into_parent(stack);
            }
        }
    }
    if name == "li" {
        // Close a sibling <li> inside the same list.
        let list = stack.iter().rposition(|e| e.tag == "ul" || e.tag == "ol");
        let item = stack.iter().rposition(|e| e.tag == "li");
        if let Some(item) = item {
            if list.map_or(true, |l| item > l) {
                while stack.len() > item {
                    pop_into_parent(stack);
                }
            }
        }
    }
}

// ============================================================================
// Serialising
// ============================================================================

pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        serialize_node(node, &mut out);
    }
    out
}

fn serialize_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (k, v) in &el.attrs {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                out.push_str(&html_escape(v));
                out.push('"');
            }
            out.push('>');
            if is_void(&el.tag) {
                return;
            }
            for child in &el.children {
                serialize_node(child, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// ============================================================================
// Traversal
// ============================================================================

pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) if el.tag == "script" || el.tag == "style" => {}
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Every element matching `pred`, in document order.
pub fn find_all<'a>(nodes: &'a [Node], pred: &dyn Fn(&Element) -> bool) -> Vec<&'a Element> {
    let mut found = Vec::new();
    walk(nodes, pred, &mut found);
    found
}

fn walk<'a>(nodes: &'a [Node], pred: &dyn Fn(&Element) -> bool, found: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(el) = node {
            if pred(el) {
                found.push(el);
            }
            walk(&el.children, pred, found);
        }
    }
}

pub fn find_first<'a>(nodes: &'a [Node], tag: &str) -> Option<&'a Element> {
    find_all(nodes, &|e| e.tag == tag).into_iter().next()
}

/// Number of elements with any of the given tag names.
pub fn count_tags(nodes: &[Node], tags: &[&str]) -> usize {
    find_all(nodes, &|e| tags.contains(&e.tag.as_str())).len()
}

/// Drop elements (and their content) whose tag is in `tags`.
pub fn remove_tags(nodes: &mut Vec<Node>, tags: &[&str]) {
    nodes.retain(|n| !matches!(n, Node::Element(el) if tags.contains(&el.tag.as_str())));
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            remove_tags(&mut el.children, tags);
        }
    }
}

/// Remove elements with no text and no media, bottom-up. `br`, `hr` and
/// `img` always survive.
pub fn remove_empty_elements(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            remove_empty_elements(&mut el.children);
        }
    }
    nodes.retain(|n| match n {
        Node::Text(_) => true,
        Node::Element(el) => {
            matches!(el.tag.as_str(), "br" | "hr" | "img" | "td" | "th")
                || !el.text().trim().is_empty()
                || count_tags(&el.children, &["img", "br", "hr"]) > 0
        }
    });
}

// ============================================================================
// Text Escaping
// ============================================================================

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Decode character references, covering the full HTML5 named set.
/// Unknown names and bare `&` are left as written.
pub fn decode_entities(s: &str) -> String {
    ::html_escape::decode_html_entities(s).into_owned()
}

// ============================================================================
// Sanitising
// ============================================================================

/// Sanitise HTML for display: scripts, event handlers and `javascript:` URLs
/// are dropped; formatting markup survives.
pub fn sanitize(html: &str) -> String {
    ammonia::clean(html)
}

/// Tags removed together with their content on import.
const STRIPPED_WITH_CONTENT: &[&str] = &[
    "head", "title", "iframe", "object", "embed", "applet", "form", "select", "textarea", "button",
    "noscript",
];

/// Page chrome removed when HTML is turned into editor content.
const PAGE_CHROME: &[&str] = &["nav", "footer", "header", "aside"];

/// Sanitise imported HTML. With `strip_chrome`, navigation and page chrome
/// are removed as well, leaving only the article body.
pub fn sanitize_import(html: &str, strip_chrome: bool) -> String {
    let mut builder = ammonia::Builder::default();
    builder.add_clean_content_tags(STRIPPED_WITH_CONTENT);
    if strip_chrome {
        builder.rm_tags(PAGE_CHROME);
        builder.add_clean_content_tags(PAGE_CHROME);
    }
    builder.clean(html).to_string()
}

// ============================================================================
// Text Conversion
// ============================================================================

/// Plain text with line breaks at block boundaries.
pub fn html_to_text(html: &str) -> String {
    let nodes = parse_fragment(html);
    let mut out = String::new();
    block_text(&nodes, &mut out);
    tidy_lines(&out)
}

fn block_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => match el.tag.as_str() {
                "script" | "style" => {}
                "br" => out.push('\n'),
                tag if BLOCK_TAGS.contains(&tag) => {
                    ensure_newline(out);
                    block_text(&el.children, out);
                    out.push('\n');
                    if heading_level(tag).is_some() || tag == "p" {
                        out.push('\n');
                    }
                }
                _ => block_text(&el.children, out),
            },
        }
    }
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Trim every line, collapse runs of blank lines into one.
fn tidy_lines(text: &str) -> String {
    let mut out = String::new();
    let mut blank = 0;
    for line in text.lines() {
        let line = collapse_spaces(line);
        if line.is_empty() {
            blank += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        blank = 0;
    }
    out
}

/// Collapse every whitespace run (including non-breaking spaces) into one space.
pub fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_tags(html: &str) -> String {
    text_content(&parse_fragment(html))
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words in editor content: tags and entities dropped, punctuation removed
/// (Latin accented letters kept), then whitespace-split.
pub fn content_word_count(html: &str) -> usize {
    let text = strip_tags(html);
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    count_words(&cleaned)
}

/// Text laid out for a paginated document: headings prefixed by `#`
/// markers, list items by bullets, blank line after headings.
pub fn html_to_print_text(html: &str) -> String {
    let nodes = parse_fragment(html);
    let mut out = String::new();
    print_text(&nodes, &mut out);
    let mut result = String::new();
    let mut blank = 0;
    for line in out.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank += 1;
            continue;
        }
        if !result.is_empty() {
            result.push_str(if blank > 0 { "\n\n" } else { "\n" });
        }
        result.push_str(line.trim_start());
        blank = 0;
    }
    result
}

fn print_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => {
                let t = collapse_spaces(t);
                if !t.is_empty() {
                    out.push_str(&t);
                    out.push(' ');
                }
            }
            Node::Element(el) => {
                let tag = el.tag.as_str();
                if tag == "script" || tag == "style" {
                    continue;
                }
                let level = heading_level(tag);
                if level.is_some() || matches!(tag, "p" | "div" | "br") {
                    ensure_newline(out);
                }
                if let Some(level) = level {
                    out.push_str(&"#".repeat(level));
                    out.push(' ');
                }
                if tag == "li" {
                    ensure_newline(out);
                    out.push_str("• ");
                }
                print_text(&el.children, out);
                if level.is_some() || matches!(tag, "p" | "div" | "li") {
                    out.push('\n');
                }
                if level.is_some() {
                    out.push('\n');
                }
            }
        }
    }
}

// ============================================================================
// Blocks
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Heading(usize),
    Paragraph,
    ListItem { ordered: bool, index: usize },
    Quote,
    Code,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

/// Flatten content into top-level text blocks, for writers that only know
/// about paragraphs.
pub fn html_to_blocks(html: &str) -> Vec<Block> {
    let nodes = parse_fragment(html);
    let mut blocks = Vec::new();
    collect_blocks(&nodes, &mut blocks);
    blocks
}

fn collect_blocks(nodes: &[Node], blocks: &mut Vec<Block>) {
    let mut inline = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => inline.push_str(t),
            Node::Element(el) => {
                let tag = el.tag.as_str();
                let block = if let Some(level) = heading_level(tag) {
                    Some(BlockKind::Heading(level))
                } else {
                    match tag {
                        "p" => Some(BlockKind::Paragraph),
                        "blockquote" => Some(BlockKind::Quote),
                        "pre" => Some(BlockKind::Code),
                        _ => None,
                    }
                };

                if let Some(kind) = block {
                    flush_inline(&mut inline, blocks);
                    let text = if kind == BlockKind::Code {
                        el.text().trim_matches('\n').to_string()
                    } else {
                        collapse_spaces(&el.text())
                    };
                    if !text.is_empty() {
                        blocks.push(Block { kind, text });
                    }
                } else if tag == "ul" || tag == "ol" {
                    flush_inline(&mut inline, blocks);
                    let ordered = tag == "ol";
                    let items = el.children.iter().filter_map(|c| match c {
                        Node::Element(li) if li.tag == "li" => Some(li),
                        _ => None,
                    });
                    for (i, li) in items.enumerate() {
                        let text = collapse_spaces(&li.text());
                        if !text.is_empty() {
                            blocks.push(Block {
                                kind: BlockKind::ListItem { ordered, index: i + 1 },
                                text,
                            });
                        }
                    }
                } else if matches!(tag, "div" | "section" | "article" | "table" | "tbody" | "thead" | "tr" | "li") {
                    flush_inline(&mut inline, blocks);
                    collect_blocks(&el.children, blocks);
                } else if tag == "br" {
                    inline.push('\n');
                } else if tag != "script" && tag != "style" {
                    inline.push_str(&el.text());
                }
            }
        }
    }
    flush_inline(&mut inline, blocks);
}

fn flush_inline(inline: &mut String, blocks: &mut Vec<Block>) {
    let text = collapse_spaces(inline);
    if !text.is_empty() {
        blocks.push(Block {
            kind: BlockKind::Paragraph,
            text,
        });
    }
    inline.clear();
}

// ============================================================================
// Markdown Conversion
// ============================================================================

pub fn html_to_markdown(html: &str) -> String {
    let nodes = parse_fragment(html);
    let md = nodes_to_markdown(&nodes);
    let mut out = String::new();
    let mut blank = 0;
    for line in md.lines() {
        if line.trim().is_empty() {
            blank += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line.trim_end());
        blank = 0;
    }
    out
}

fn nodes_to_markdown(nodes: &[Node]) -> String {
    let mut result = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => result.push_str(t),
            Node::Element(el) => element_to_markdown(el, &mut result),
        }
    }
    result
}

fn element_to_markdown(el: &Element, result: &mut String) {
    let text = || collapse_spaces(&el.text());
    match el.tag.as_str() {
        tag if heading_level(tag).is_some() => {
            let level = heading_level(tag).unwrap_or(1);
            result.push_str(&format!("\n{} {}\n\n", "#".repeat(level), text()));
        }
        "p" => result.push_str(&format!("\n{}\n\n", nodes_to_markdown(&el.children).trim())),
        "strong" | "b" => result.push_str(&format!("**{}**", text())),
        "em" | "i" => result.push_str(&format!("*{}*", text())),
        "u" => result.push_str(&format!("<u>{}</u>", text())),
        "del" | "s" | "strike" => result.push_str(&format!("~~{}~~", text())),
        "a" => result.push_str(&format!("[{}]({})", text(), el.attr("href").unwrap_or("#"))),
        "ul" | "ol" => {
            result.push('\n');
            let items = find_all(&el.children, &|e| e.tag == "li");
            for (i, li) in items.iter().enumerate() {
                let marker = if el.tag == "ol" { format!("{}.", i + 1) } else { "-".to_string() };
                result.push_str(&format!("{} {}\n", marker, collapse_spaces(&li.text())));
            }
            result.push('\n');
        }
        "blockquote" => {
            result.push('\n');
            for line in el.text().lines().filter(|l| !l.trim().is_empty()) {
                result.push_str(&format!("> {}\n", line.trim()));
            }
            result.push('\n');
        }
        "code" => result.push_str(&format!("`{}`", el.text())),
        "pre" => result.push_str(&format!("\n```\n{}\n```\n\n", el.text().trim_matches('\n'))),
        "hr" => result.push_str("\n---\n\n"),
        "br" => result.push('\n'),
        "script" | "style" => {}
        _ => result.push_str(&nodes_to_markdown(&el.children)),
    }
}

// ============================================================================
// Misc
// ============================================================================

/// Headings in document order as (level, text), for tables of contents.
pub fn extract_headings(html: &str) -> Vec<(usize, String)> {
    let nodes = parse_fragment(html);
    find_all(&nodes, &|e| e.heading_level().is_some())
        .into_iter()
        .filter_map(|e| {
            let text = collapse_spaces(&e.text());
            e.heading_level().filter(|_| !text.is_empty()).map(|l| (l, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let nodes = parse_fragment("<p>Hello <strong>world</strong>!</p>");
        assert_eq!(nodes.len(), 1);
        let Node::Element(p) = &nodes[0] else { panic!("expected element") };
        assert_eq!(p.tag, "p");
        assert_eq!(p.text(), "Hello world!");
        assert_eq!(serialize(&nodes), "<p>Hello <strong>world</strong>!</p>");
    }

    #[test]
    fn test_parse_attributes_and_void() {
        let nodes = parse_fragment(r#"<A HREF="x.html" class='c'>link</a><br><img src=a.png alt="A &amp; B"/>"#);
        let links = find_all(&nodes, &|e| e.tag == "a");
        assert_eq!(links[0].attr("href"), Some("x.html"));
        assert_eq!(links[0].attr("class"), Some("c"));
        let img = find_first(&nodes, "img").unwrap();
        assert_eq!(img.attr("alt"), Some("A & B"));
        assert_eq!(img.attr("src"), Some("a.png"));
        assert_eq!(count_tags(&nodes, &["br", "img"]), 2);
    }

    #[test]
    fn test_parse_forgiving() {
        let nodes = parse_fragment("<ul><li>one<li>two</ul></span><p>a<p>b");
        assert_eq!(count_tags(&nodes, &["li"]), 2);
        assert_eq!(count_tags(&nodes, &["p"]), 2);
        assert_eq!(text_content(&nodes), "onetwoab");
    }

    #[test]
    fn test_comments_and_raw_text() {
        let nodes = parse_fragment("<!-- hi --><script>if (a < b) {}</script><p>x</p>");
        let script = find_first(&nodes, "script").unwrap();
        assert_eq!(script.text(), "if (a < b) {}");
        assert_eq!(text_content(&nodes), "x");
    }

    #[test]
    fn test_text_with_lone_angle_bracket() {
        assert_eq!(strip_tags("a < b"), "a < b");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42; &eacute; &bogus;"), "a & b <c> AB é &bogus;");
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(
            decode_entities("It&rsquo;s M&uuml;ller &euro;5 &ldquo;ok&rdquo; &hearts;"),
            "It’s Müller €5 “ok” ♥"
        );
    }

    #[test]
    fn test_named_entities_survive_conversion() {
        let html = "<p>It&rsquo;s &euro;5</p><ul><li>M&uuml;ller</li></ul>";
        let text = html_to_text(html);
        assert!(text.contains("It’s €5"), "{}", text);
        assert!(text.contains("Müller"), "{}", text);
        assert!(html_to_markdown(html).contains("It’s €5"));
        assert_eq!(serialize(&parse_fragment(html)), "<p>It’s €5</p><ul><li>Müller</li></ul>");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_sanitize_drops_scripts_and_handlers() {
        let dirty = r#"<p onclick="evil()">Hi<script>alert(1)</script> <a href="javascript:alert(1)">x</a></p>"#;
        let clean = sanitize(dirty);
        assert!(!clean.contains("<script"));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("javascript:"));
        assert!(clean.contains("Hi"));
    }

    #[test]
    fn test_sanitize_import_strips_chrome() {
        let html = r#"<nav>Menu</nav><header>Top</header><h1 style="color:red" class="x" id="y">Title</h1><form><input></form><p>Body</p><footer>Foot</footer>"#;
        let cleaned = sanitize_import(html, true);
        assert!(!cleaned.contains("Menu"));
        assert!(!cleaned.contains("Top"));
        assert!(!cleaned.contains("Foot"));
        assert!(!cleaned.contains("style="));
        assert!(!cleaned.contains("class="));
        assert!(!cleaned.contains("id="));
        assert!(cleaned.contains("<h1>Title</h1>"));
        assert!(cleaned.contains("<p>Body</p>"));

        let kept = sanitize_import(html, false);
        assert!(kept.contains("Menu"));
    }

    #[test]
    fn test_html_to_text_blocks() {
        let text = html_to_text("<h1>Title</h1><p>First  para</p><ul><li>a</li><li>b</li></ul>");
        assert_eq!(text, "Title\n\nFirst para\n\na\nb");
    }

    #[test]
    fn test_print_text_markers() {
        let text = html_to_print_text("<h2>Section</h2><p>Body text</p><ul><li>one</li><li>two</li></ul>");
        assert_eq!(text, "## Section\n\nBody text\n• one\n• two");
    }

    #[test]
    fn test_content_word_count() {
        assert_eq!(content_word_count("<p>Olá, mundo! Ação&nbsp;rápida.</p>"), 4);
        assert_eq!(content_word_count(""), 0);
    }

    #[test]
    fn test_html_to_markdown() {
        let md = html_to_markdown(
            r#"<h1>T</h1><p>Some <strong>bold</strong> and <em>it</em> <a href="http://x.y">link</a></p><ol><li>a</li><li>b</li></ol><pre>code</pre><hr>"#,
        );
        assert_eq!(
            md,
            "# T\n\nSome **bold** and *it* [link](http://x.y)\n\n1. a\n2. b\n\n```\ncode\n```\n\n---"
        );
    }

    #[test]
    fn test_blocks() {
        let blocks = html_to_blocks("<h2>H</h2>loose<p>P</p><ol><li>x</li></ol><blockquote>q</blockquote>");
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading(2),
                BlockKind::Paragraph,
                BlockKind::Paragraph,
                BlockKind::ListItem { ordered: true, index: 1 },
                BlockKind::Quote,
            ]
        );
        assert_eq!(blocks[1].text, "loose");
    }

    #[test]
    fn test_remove_empty_elements() {
        let mut nodes = parse_fragment("<p> </p><p><img src=x></p><div><span></span></div><p>ok</p>");
        remove_empty_elements(&mut nodes);
        assert_eq!(serialize(&nodes), r#"<p><img src="x"></p><p>ok</p>"#);
    }

    #[test]
    fn test_extract_headings() {
        let headings = extract_headings("<h1>A</h1><p>x</p><h3> B </h3><h2></h2>");
        assert_eq!(headings, vec![(1, "A".to_string()), (3, "B".to_string())]);
    }
}
