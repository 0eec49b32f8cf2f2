//! Batch report types.

use std::path::PathBuf;

use serde::Serialize;

/// A page that could not be processed. The batch continues without it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct FileFailure {
    pub file: PathBuf,
    pub message: String,
}

impl FileFailure {
    #[must_use]
    pub fn new(file: PathBuf, message: String) -> Self {
        Self { file, message }
    }

    /// Format the failure for human-readable output.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!("{}: {}", self.file.display(), self.message)
    }
}

/// Outcome of running one operation over a list of pages.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct BatchReport {
    /// Name of the operation, as given on the command line.
    pub operation: String,
    /// Pages rewritten.
    pub modified: Vec<PathBuf>,
    /// Pages read but left as they were.
    pub unchanged: Vec<PathBuf>,
    /// Listed pages that do not exist.
    pub missing: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_owned(),
            modified: Vec::new(),
            unchanged: Vec::new(),
            missing: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Whether every page was processed.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of pages that were read (modified or unchanged).
    #[must_use]
    pub fn processed(&self) -> usize {
        self.modified.len() + self.unchanged.len()
    }
}

/// Titles and content sizes of one FR/EN page pair.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct PairSummary {
    /// Base key of the merged page (`glossary`, `actors`, ...).
    pub key: String,
    pub fr_file: PathBuf,
    pub en_file: PathBuf,
    /// Page the pair would be merged into.
    pub output: PathBuf,
    pub fr_title: String,
    pub en_title: String,
    /// Length in characters of the `<nav>` block.
    pub fr_nav_length: usize,
    pub en_nav_length: usize,
    /// Length in characters of the trimmed `<main>` content.
    pub fr_main_length: usize,
    pub en_main_length: usize,
}

/// Read-only survey of the FR/EN resource pages.
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct MergeReport {
    pub pairs: Vec<PairSummary>,
    /// Keys of the pairs with at least one file missing.
    pub missing: Vec<String>,
    /// Pages that exist but could not be read.
    pub failures: Vec<FileFailure>,
}

impl MergeReport {
    /// Whether every existing page could be read.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = BatchReport::new("nav add-about");
        report.modified.push(PathBuf::from("index.html"));
        report.unchanged.push(PathBuf::from("expert.html"));
        report.missing.push(PathBuf::from("maps.html"));
        assert_eq!(report.processed(), 2);
        assert!(report.ok());

        report.failures.push(FileFailure::new(
            PathBuf::from("resources.html"),
            "permission denied".to_owned(),
        ));
        assert!(!report.ok());
        assert_eq!(
            report.failures[0].format_human_readable(),
            "resources.html: permission denied"
        );
    }
}
