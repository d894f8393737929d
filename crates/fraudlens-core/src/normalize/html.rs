//! Readable-text extraction from HTML pages.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose subtrees never count as content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside",
];

/// Likely content containers, most preferred first.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "div.content",
    "div.main-content",
    "div.post-content",
    "div.post",
];

/// Extract newline-separated readable text from an HTML document.
///
/// The first non-empty content container wins; otherwise the whole `<body>`
/// is used. Navigation, headers, footers and scripts are dropped.
pub fn extract_readable_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for css in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let container = document
            .select(&selector)
            .find(|el| !is_inside_skipped(*el));
        if let Some(element) = container {
            let text = element_text(element);
            if !text.is_empty() {
                return text;
            }
        }
    }

    let body = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next())
        .unwrap_or_else(|| document.root_element());
    element_text(body)
}

fn is_inside_skipped(element: ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    let mut pieces = Vec::new();
    collect_text(element, &mut pieces);
    pieces.join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_article() {
        let html = r#"<html><body>
            <nav>Home | Shop</nav>
            <div class="content">Sidebar-ish content</div>
            <article><h1>Great product</h1><p>Five stars, 100% real!</p></article>
        </body></html>"#;
        assert_eq!(extract_readable_text(html), "Great product\nFive stars, 100% real!");
    }

    #[test]
    fn test_container_order() {
        let html = r#"<body><div class="post">post</div><div class="main-content">main content</div></body>"#;
        assert_eq!(extract_readable_text(html), "main content");
    }

    #[test]
    fn test_falls_back_to_body_without_chrome() {
        let html = r#"<html><head><title>T</title><style>p{}</style></head><body>
            <header>Logo</header>
            <p>Take two tablets daily.</p>
            <script>var tracking = 1;</script>
            <footer>Copyright</footer>
        </body></html>"#;
        assert_eq!(extract_readable_text(html), "Take two tablets daily.");
    }

    #[test]
    fn test_skips_scripts_inside_container() {
        let html = "<main><p>Dose: 5mg</p><script>alert(1)</script><aside>Ad</aside></main>";
        assert_eq!(extract_readable_text(html), "Dose: 5mg");
    }

    #[test]
    fn test_ignores_containers_inside_chrome() {
        let html = "<body><aside><article>promo</article></aside><p>real text</p></body>";
        assert_eq!(extract_readable_text(html), "real text");
    }

    #[test]
    fn test_empty_container_falls_through() {
        let html = "<body><article>   </article><main>fallback main</main></body>";
        assert_eq!(extract_readable_text(html), "fallback main");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(extract_readable_text(""), "");
    }
}
