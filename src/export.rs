//! CSV export of article records.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::{ArticleRecord, COLUMNS};

/// Errors raised while writing the output table
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write records as CSV to any writer, header row first.
///
/// Returns the number of data rows written. Missing fields become empty cells.
pub fn write_csv<W: Write>(records: &[ArticleRecord], writer: W) -> Result<usize, ExportError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush().map_err(csv::Error::from)?;

    Ok(records.len())
}

/// Write records to `path`, replacing any existing file.
pub fn export_csv(records: &[ArticleRecord], path: &Path) -> Result<usize, ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;

    write_csv(records, file)
}

/// Read records back from a CSV file written by [`export_csv`].
pub fn read_csv(path: &Path) -> Result<Vec<ArticleRecord>, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize()
        .collect::<Result<Vec<ArticleRecord>, csv::Error>>()
        .map_err(ExportError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_export_has_header_only() {
        let mut buf = Vec::new();
        let rows = write_csv(&[], &mut buf).unwrap();
        assert_eq!(rows, 0);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Title,Authors With Their Affiliations,Publication Date,DOI,Abstract\n"
        );
    }

    #[test]
    fn test_quotes_delimiters_and_newlines() {
        let record = ArticleRecord::new()
            .title("Prices, Promotions and \"Deals\"")
            .abstract_text("Line one\nLine two");

        let mut buf = Vec::new();
        write_csv(&[record], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("\"Prices, Promotions and \"\"Deals\"\"\",,,,\"Line one\nLine two\""));
    }

    #[test]
    fn test_export_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("scraped_data.csv");

        let records = vec![
            ArticleRecord::new()
                .title("First")
                .authors("Jane Doe.University of X.")
                .publication_date("March 5, 2024")
                .doi("10.1177/1")
                .abstract_text("Abstract, with a comma"),
            ArticleRecord::new().title("Second").doi("10.1177/2"),
        ];

        assert_eq!(export_csv(&records, &path).unwrap(), 2);
        let read = read_csv(&path).unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scraped_data.csv");
        std::fs::write(&path, "stale content that is much longer than the new file\n").unwrap();

        export_csv(&[], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Title,"));
        assert!(!text.contains("stale"));
    }

    #[test]
    fn test_export_to_directory_fails() {
        let dir = tempdir().unwrap();
        let err = export_csv(&[], dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
