//! Article record extracted from a single article page.

use serde::{Deserialize, Serialize};

/// Column headers of the exported table, in output order.
pub const COLUMNS: [&str; 5] = [
    "Title",
    "Authors With Their Affiliations",
    "Publication Date",
    "DOI",
    "Abstract",
];

/// Metadata pulled from one article page
///
/// Every field is optional: a missing piece of markup is normal site
/// variability, not an error. Serialization uses the exported column names so
/// the same struct is written to and read back from CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Article title from the `dc.Title` meta tag
    #[serde(rename = "Title")]
    pub title: Option<String>,

    /// Author and affiliation blocks, cleaned into period-separated text
    #[serde(rename = "Authors With Their Affiliations")]
    pub authors: Option<String>,

    /// Free-text "first published online" date label
    #[serde(rename = "Publication Date")]
    pub publication_date: Option<String>,

    /// DOI from the page's ad-parameter script
    #[serde(rename = "DOI")]
    pub doi: Option<String>,

    /// Plain text of the abstract
    #[serde(rename = "Abstract")]
    pub r#abstract: Option<String>,
}

impl ArticleRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this record belongs in the output (it has a non-empty title)
    pub fn is_retained(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Field values in column order, `None` rendered as an empty string
    pub fn to_row(&self) -> [&str; 5] {
        [
            self.title.as_deref().unwrap_or_default(),
            self.authors.as_deref().unwrap_or_default(),
            self.publication_date.as_deref().unwrap_or_default(),
            self.doi.as_deref().unwrap_or_default(),
            self.r#abstract.as_deref().unwrap_or_default(),
        ]
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the authors
    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = Some(authors.into());
        self
    }

    /// Set the publication date
    pub fn publication_date(mut self, date: impl Into<String>) -> Self {
        self.publication_date = Some(date.into());
        self
    }

    /// Set the DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    /// Set the abstract
    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.r#abstract = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retained_requires_non_empty_title() {
        assert!(!ArticleRecord::new().is_retained());
        assert!(!ArticleRecord::new().title("").is_retained());
        assert!(ArticleRecord::new().title("A Study").is_retained());
    }

    #[test]
    fn test_to_row_renders_missing_fields_empty() {
        let record = ArticleRecord::new().title("A Study").doi("10.1/x");
        assert_eq!(record.to_row(), ["A Study", "", "", "10.1/x", ""]);
    }

    #[test]
    fn test_json_uses_column_names() {
        let record = ArticleRecord::new().title("A Study");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Title"], "A Study");
        assert!(json["Abstract"].is_null());
    }
}
