//! Error types for the media pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the illustration and slideshow tools.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediaError {
    /// The input directory does not exist or is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A required external program is not on `PATH`.
    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    /// The external program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program exited unsuccessfully.
    #[error("{program} failed ({}): {stderr}", describe_exit(*.code))]
    ToolFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Planned destinations already exist; nothing was converted.
    #[error("refusing to overwrite existing files: {}", format_paths(.0))]
    Collisions(Vec<PathBuf>),

    /// A single conversion target appeared between planning and conversion.
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// The converter produced no output (or an empty file).
    #[error("conversion failed for {}", .0.display())]
    ConversionFailed(PathBuf),

    /// The slideshow output exists and overwriting was not requested.
    #[error("output exists (use --overwrite): {}", .0.display())]
    OutputExists(PathBuf),

    /// The frame size is not of the form `WxH`.
    #[error("invalid size: {0} (expected WxH)")]
    InvalidSize(String),

    /// The slideshow pattern matched no image.
    #[error("no images found: {0}")]
    NoImages(String),

    /// Crossfade timing that cannot produce a valid filter graph.
    #[error("invalid slideshow timing: {0}")]
    InvalidTiming(String),

    /// The slideshow glob pattern is malformed.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MediaError {
    /// Process exit code the command-line front end reports for this error.
    ///
    /// `2` for environment/usage problems, `3` when the tool refuses to
    /// overwrite, `1` for everything else.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotADirectory(_)
            | Self::ToolNotFound(_)
            | Self::InvalidSize(_)
            | Self::NoImages(_) => 2,
            Self::Collisions(_) | Self::OutputExists(_) => 3,
            _ => 1,
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    code.map_or_else(|| "killed by signal".to_owned(), |c| format!("exit code {c}"))
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MediaError::ToolNotFound("ffmpeg".to_owned()).exit_code(), 2);
        assert_eq!(MediaError::InvalidSize("big".to_owned()).exit_code(), 2);
        assert_eq!(
            MediaError::OutputExists(PathBuf::from("out.mp4")).exit_code(),
            3
        );
        assert_eq!(
            MediaError::ConversionFailed(PathBuf::from("a.png")).exit_code(),
            1
        );
    }

    #[test]
    fn test_collisions_lists_every_path() {
        let err = MediaError::Collisions(vec![
            PathBuf::from("illustrations/illus01.jpg"),
            PathBuf::from("illustrations/illus02.jpg"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("illus01.jpg"));
        assert!(msg.contains("illus02.jpg"));
    }
}
