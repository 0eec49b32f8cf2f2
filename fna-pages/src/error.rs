//! Error types for the page tools.

use std::path::PathBuf;

use fna_media::MediaError;
use thiserror::Error;

/// Failures of the page reformatters and navigation patches.
///
/// Per-file problems inside a batch do not surface here; they are collected
/// in [`crate::BatchReport::failures`] and the batch carries on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PageError {
    /// The page whose `<style>` is reused could not be found.
    #[error("template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A required input file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// `partials/nav.html` is missing, so nothing can be injected.
    #[error("navigation partial not found: {}", .0.display())]
    NavPartialNotFound(PathBuf),

    /// The directory to reformat does not exist.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// An external converter failed.
    #[error(transparent)]
    Tool(#[from] MediaError),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
