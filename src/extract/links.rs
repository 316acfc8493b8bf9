//! Article link discovery on a listing (table of contents) page.

use scraper::{Html, Selector};

/// Path prefix shared by article links on the listing page.
pub const ARTICLE_LINK_PREFIX: &str = "/doi/abs/";

/// Collect the `href` of every anchor that starts with `prefix`.
///
/// Document order is preserved and duplicates are kept. A page without
/// matching anchors yields an empty list.
pub fn collect_links(html: &str, prefix: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with(prefix))
        .map(|href| href.to_string())
        .collect()
}

/// Turn a discovered href into an absolute URL.
///
/// Relative hrefs are appended to `base_url`; absolute ones pass through.
pub fn resolve_link(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    format!("{}{}", base_url.trim_end_matches('/'), href)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_links_keeps_order_and_duplicates() {
        let html = r#"
            <html><body>
                <a href="/doi/abs/10.1177/1">First</a>
                <a href="/toc/JMX/current">Issue</a>
                <a href="/doi/abs/10.1177/2">Second</a>
                <a href="/doi/full/10.1177/2">Full text</a>
                <a href="/doi/abs/10.1177/1">First again</a>
                <a>No href</a>
            </body></html>
        "#;

        let links = collect_links(html, ARTICLE_LINK_PREFIX);
        assert_eq!(
            links,
            vec![
                "/doi/abs/10.1177/1",
                "/doi/abs/10.1177/2",
                "/doi/abs/10.1177/1",
            ]
        );
    }

    #[test]
    fn test_collect_links_empty_page() {
        let links = collect_links("<html><body><p>Nothing here</p></body></html>", "/doi/abs/");
        assert!(links.is_empty());
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("https://journals.sagepub.com", "/doi/abs/10.1177/1"),
            "https://journals.sagepub.com/doi/abs/10.1177/1"
        );
        assert_eq!(
            resolve_link("https://journals.sagepub.com/", "/doi/abs/10.1177/1"),
            "https://journals.sagepub.com/doi/abs/10.1177/1"
        );
        assert_eq!(
            resolve_link("https://journals.sagepub.com", "https://other.org/doi/abs/1"),
            "https://other.org/doi/abs/1"
        );
    }
}
