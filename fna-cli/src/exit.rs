use clap::error::ErrorKind;
use fna_media::MediaError;
use fna_pages::PageError;

/// Process exit code for a command line that did not parse.
///
/// `0` after printing help or the version, `1` when a command got the wrong
/// number of arguments, `2` for any other usage error.
#[must_use]
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        ErrorKind::MissingRequiredArgument
        | ErrorKind::TooManyValues
        | ErrorKind::TooFewValues
        | ErrorKind::WrongNumberOfValues
        | ErrorKind::UnknownArgument => 1,
        _ => 2,
    }
}

/// Process exit code for a failed command.
///
/// `2` for usage and environment problems (missing directory or tool, bad
/// size, no images), `3` when the command refused to overwrite files, `1`
/// otherwise.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(media) = cause.downcast_ref::<MediaError>() {
            return i32::from(media.exit_code());
        }
        if let Some(page) = cause.downcast_ref::<PageError>() {
            return match page {
                PageError::Tool(media) => i32::from(media.exit_code()),
                _ => 1,
            };
        }
    }
    1
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn parse_code(args: &[&str]) -> i32 {
        usage_exit_code(&Cli::try_parse_from(args.iter().copied()).unwrap_err())
    }

    #[test]
    fn test_wrong_argument_count_exits_one() {
        assert_eq!(parse_code(&["fna", "postprocess", "only.docx"]), 1);
        assert_eq!(parse_code(&["fna", "postprocess", "a.docx", "a.html", "b.html"]), 1);
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        assert_eq!(parse_code(&["fna", "--help"]), 0);
        assert_eq!(parse_code(&["fna", "--version"]), 0);
    }

    #[test]
    fn test_invalid_value_exits_two() {
        assert_eq!(parse_code(&["fna", "nav", "rename-all"]), 2);
    }

    #[test]
    fn test_media_errors_map_to_their_codes() {
        let err = anyhow::Error::new(MediaError::OutputExists(PathBuf::from("a.mp4")));
        assert_eq!(exit_code(&err), 3);
        let err = anyhow::Error::new(MediaError::ToolNotFound("ffmpeg".to_owned()));
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_tool_error_inside_page_error() {
        let err = anyhow::Error::new(PageError::Tool(MediaError::ToolNotFound(
            "textutil".to_owned(),
        )));
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_other_errors_are_generic() {
        let err = anyhow::Error::new(PageError::NavPartialNotFound(PathBuf::from("nav.html")));
        assert_eq!(exit_code(&err), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
