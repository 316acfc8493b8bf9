//! Markup extraction for article and listing pages.
//!
//! The rules target the journal platform's article markup:
//!
//! | Field            | Source                                                          |
//! |------------------|-----------------------------------------------------------------|
//! | title            | `<meta name="dc.Title" content="...">`                          |
//! | authors          | elements with `id` starting `corresp1-`                         |
//! | publication date | `div.core-history` entry labelled "Article first published online" |
//! | DOI              | `doi: '...'` inside the `var journalAdParams =` script          |
//! | abstract         | `section#abstract [role="paragraph"]`                           |
//!
//! Each field is looked up independently. A lookup that finds nothing yields
//! `None` and never affects the other fields.

mod links;
mod text;

pub use links::{collect_links, resolve_link, ARTICLE_LINK_PREFIX};
pub use text::{clean_authors, stripped_text};

use text::quoted_doi;

use scraper::{Html, Selector};

use crate::models::ArticleRecord;

const TITLE_META_NAME: &str = "dc.Title";
const AUTHOR_ID_PREFIX: &str = "corresp1-";
const PUBLISHED_ONLINE_LABEL: &str = "Article first published online";
const AD_PARAMS_MARKER: &str = "var journalAdParams =";

/// Extract every field from an article page.
pub fn extract_article(html: &str) -> ArticleRecord {
    let document = Html::parse_document(html);

    ArticleRecord {
        title: extract_title(&document),
        authors: extract_authors(&document),
        publication_date: extract_publication_date(&document),
        doi: extract_doi(&document),
        r#abstract: extract_abstract(&document),
    }
}

/// Title from the Dublin Core meta tag
pub fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{}"]"#, TITLE_META_NAME)).ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr("content")
        .map(|s| s.to_string())
}

/// Authors and affiliations, joined and cleaned
pub fn extract_authors(document: &Html) -> Option<String> {
    let selector = Selector::parse(&format!(r#"[id^="{}"]"#, AUTHOR_ID_PREFIX)).ok()?;
    let blocks: Vec<String> = document
        .select(&selector)
        .map(|el| stripped_text(&el))
        .collect();

    if blocks.is_empty() {
        return None;
    }

    Some(clean_authors(&blocks.join(" ")))
}

/// Date text following the "first published online" label.
///
/// Only the first `b.core-label` of each candidate div is consulted, so a
/// wrapper div around several entries never matches through a later label.
pub fn extract_publication_date(document: &Html) -> Option<String> {
    let history_selector = Selector::parse("div.core-history").ok()?;
    let div_selector = Selector::parse("div").ok()?;
    let label_selector = Selector::parse("b.core-label").ok()?;

    let history = document.select(&history_selector).next()?;

    let entry = history
        .select(&div_selector)
        .filter(|div| div.id() != history.id())
        .find(|div| {
            div.select(&label_selector)
                .next()
                .map(|label| label.text().collect::<String>())
                .is_some_and(|label| label.contains(PUBLISHED_ONLINE_LABEL))
        })?;

    let text = stripped_text(&entry);
    let (_, date) = text.split_once(':')?;
    Some(date.trim().to_string())
}

/// DOI from the advertising parameters script
pub fn extract_doi(document: &Html) -> Option<String> {
    let selector = Selector::parse("script").ok()?;

    document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .filter(|body| body.contains(AD_PARAMS_MARKER))
        .find_map(|body| quoted_doi(&body))
}

/// Abstract paragraph text
pub fn extract_abstract(document: &Html) -> Option<String> {
    let section_selector = Selector::parse("section#abstract").ok()?;
    let paragraph_selector = Selector::parse(r#"[role="paragraph"]"#).ok()?;

    let section = document.select(&section_selector).next()?;
    let paragraph = section.select(&paragraph_selector).next()?;
    Some(stripped_text(&paragraph))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"
        <html>
        <head>
            <meta name="dc.Title" content="Pricing Under Uncertainty">
            <meta name="dc.Creator" content="Jane Doe">
            <script>window.dataLayer = [];</script>
            <script>
                var journalAdParams = {
                    journal: 'jmx',
                    doi: '10.1177/0025149241234567',
                    other: 1
                };
            </script>
        </head>
        <body>
            <div id="corresp1-1">Jane Doe (Department of Marketing, University of X)</div>
            <div id="corresp1-2">John Roe <span>email:john@y.edu</span></div>
            <div class="core-history">
                <div><b class="core-label">Received:</b> <span>January 2, 2024</span></div>
                <div><b class="core-label">Article first published online:</b> <span>March 5, 2024</span></div>
                <div><b class="core-label">Issue published:</b> <span>June 1, 2024</span></div>
            </div>
            <section id="abstract">
                <h2>Abstract</h2>
                <div role="paragraph">Firms set prices before demand is known.</div>
            </section>
        </body>
        </html>
    "#;

    #[test]
    fn test_extract_article_all_fields() {
        let record = extract_article(ARTICLE_HTML);

        assert_eq!(record.title.as_deref(), Some("Pricing Under Uncertainty"));
        assert_eq!(
            record.authors.as_deref(),
            Some("Jane Doe.Department of Marketing, University of X.John Roe.")
        );
        assert_eq!(record.publication_date.as_deref(), Some("March 5, 2024"));
        assert_eq!(record.doi.as_deref(), Some("10.1177/0025149241234567"));
        assert_eq!(
            record.r#abstract.as_deref(),
            Some("Firms set prices before demand is known.")
        );
    }

    #[test]
    fn test_missing_markup_yields_none() {
        let record = extract_article("<html><head></head><body><p>Hi</p></body></html>");
        assert_eq!(record, ArticleRecord::default());
        assert!(!record.is_retained());
    }

    #[test]
    fn test_title_without_content_attribute() {
        let doc = Html::parse_document(r#"<meta name="dc.Title">"#);
        assert_eq!(extract_title(&doc), None);
    }

    #[test]
    fn test_doi_from_single_line_script() {
        let doc = Html::parse_document(
            "<script>var journalAdParams = {doi: '10.1177/0025149241234567', other: 1};</script>",
        );
        assert_eq!(extract_doi(&doc).as_deref(), Some("10.1177/0025149241234567"));
    }

    #[test]
    fn test_doi_ignores_scripts_without_marker() {
        let doc = Html::parse_document("<script>var other = {doi: '10.1/nope'};</script>");
        assert_eq!(extract_doi(&doc), None);
    }

    #[test]
    fn test_doi_marker_without_pattern() {
        let doc = Html::parse_document(r#"<script>var journalAdParams = {doi: "10.1/x"};</script>"#);
        assert_eq!(extract_doi(&doc), None);
    }

    #[test]
    fn test_publication_date_requires_label() {
        let doc = Html::parse_document(
            r#"<div class="core-history"><div><b class="core-label">Received:</b> May 1</div></div>"#,
        );
        assert_eq!(extract_publication_date(&doc), None);
    }

    #[test]
    fn test_publication_date_without_colon() {
        let doc = Html::parse_document(
            r#"<div class="core-history"><div><b class="core-label">Article first published online</b> May 1</div></div>"#,
        );
        assert_eq!(extract_publication_date(&doc), None);
    }

    #[test]
    fn test_publication_date_inside_wrapper_div() {
        let doc = Html::parse_document(
            r#"<div class="core-history"><div class="items"><div><b class="core-label">Received:</b> January 2, 2024</div><div><b class="core-label">Article first published online:</b> March 5, 2024</div></div></div>"#,
        );
        assert_eq!(extract_publication_date(&doc).as_deref(), Some("March 5, 2024"));
    }

    #[test]
    fn test_publication_date_only_first_label_counts() {
        // One entry carrying both labels is read by its first label only
        let doc = Html::parse_document(
            r#"<div class="core-history"><div><b class="core-label">Received:</b> January 2, 2024 <b class="core-label">Article first published online:</b> March 5, 2024</div></div>"#,
        );
        assert_eq!(extract_publication_date(&doc), None);
    }

    #[test]
    fn test_abstract_requires_paragraph_role() {
        let doc = Html::parse_document(r#"<section id="abstract"><p>Plain paragraph</p></section>"#);
        assert_eq!(extract_abstract(&doc), None);
    }

    #[test]
    fn test_authors_absent() {
        let doc = Html::parse_document(r#"<div id="author-1">Jane Doe</div>"#);
        assert_eq!(extract_authors(&doc), None);
    }
}
