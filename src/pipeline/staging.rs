//! On-disk staging of fetched article pages.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::ScrapeError;

/// Staged page files for one run.
///
/// Pages are written as `page_{index}.html` and read back in the order they
/// were staged. Each file is deleted once read; anything still on disk when
/// the area is dropped (after an aborted run, say) is deleted then.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
}

impl StagingArea {
    /// Use `dir` for staged files, creating it if needed
    pub fn new(dir: &Path) -> Result<Self, ScrapeError> {
        std::fs::create_dir_all(dir).map_err(|source| ScrapeError::Staging {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            pending: VecDeque::new(),
        })
    }

    /// File name used for the page at 1-based `index`
    pub fn page_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("page_{}.html", index))
    }

    /// Number of staged pages not yet read back
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Write one page to disk
    pub fn stage(&mut self, index: usize, html: &str) -> Result<PathBuf, ScrapeError> {
        let path = self.page_path(index);
        std::fs::write(&path, html).map_err(|source| ScrapeError::Staging {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Staged page");
        self.pending.push_back(path.clone());
        Ok(path)
    }

    /// Read the next staged page and delete its file
    pub fn next_page(&mut self) -> Option<Result<String, ScrapeError>> {
        let path = self.pending.pop_front()?;
        let content = std::fs::read_to_string(&path);
        let removed = std::fs::remove_file(&path);

        Some(match (content, removed) {
            (Err(source), _) | (Ok(_), Err(source)) => Err(ScrapeError::Staging { path, source }),
            (Ok(html), Ok(())) => Ok(html),
        })
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        for path in self.pending.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove staged file {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_stage_and_read_back_in_order() {
        let dir = tempdir().unwrap();
        let mut area = StagingArea::new(dir.path()).unwrap();

        let first = area.stage(1, "<p>one</p>").unwrap();
        let second = area.stage(2, "<p>two</p>").unwrap();
        assert_eq!(first, dir.path().join("page_1.html"));
        assert!(second.exists());
        assert_eq!(area.len(), 2);

        assert_eq!(area.next_page().unwrap().unwrap(), "<p>one</p>");
        assert!(!first.exists());
        assert_eq!(area.next_page().unwrap().unwrap(), "<p>two</p>");
        assert!(!second.exists());
        assert!(area.next_page().is_none());
        assert!(area.is_empty());
    }

    #[test]
    fn test_drop_removes_unread_files() {
        let dir = tempdir().unwrap();
        let path = {
            let mut area = StagingArea::new(dir.path()).unwrap();
            area.stage(1, "<p>one</p>").unwrap()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_staged_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut area = StagingArea::new(dir.path()).unwrap();
        let path = area.stage(1, "<p>one</p>").unwrap();
        std::fs::remove_file(&path).unwrap();

        let result = area.next_page().unwrap();
        assert!(matches!(result, Err(ScrapeError::Staging { .. })));
    }
}
