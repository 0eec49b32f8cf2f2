//! External program invocation.
//!
//! Everything that shells out (`textutil`, `sips`, `jpegtran`, `exiftool`,
//! `ffmpeg`) goes through [`ToolRunner`], so the pipelines can be exercised
//! in tests with a fake that records calls instead of running binaries.

use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::MediaError;

/// Captured result of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
}

/// Runs external programs.
pub trait ToolRunner {
    /// Whether `program` can be found on `PATH`.
    fn is_available(&self, program: &str) -> bool;

    /// Run `program` to completion, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::ToolNotFound`] if the program is missing,
    /// [`MediaError::Spawn`] if it cannot be started, and
    /// [`MediaError::ToolFailed`] on a non-zero exit.
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, MediaError>;

    /// Run `program` with the terminal attached, for long jobs whose progress
    /// output the user wants to see.
    ///
    /// # Errors
    ///
    /// Same as [`ToolRunner::run`].
    fn run_attached(&self, program: &str, args: &[OsString]) -> Result<(), MediaError>;
}

/// [`ToolRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn spawn_error(program: &str, source: std::io::Error) -> MediaError {
        if source.kind() == std::io::ErrorKind::NotFound {
            MediaError::ToolNotFound(program.to_owned())
        } else {
            MediaError::Spawn {
                program: program.to_owned(),
                source,
            }
        }
    }
}

impl ToolRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, MediaError> {
        debug!(program, args = %render_args(args), "running");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::spawn_error(program, e))?;

        if !output.status.success() {
            return Err(MediaError::ToolFailed {
                program: program.to_owned(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn run_attached(&self, program: &str, args: &[OsString]) -> Result<(), MediaError> {
        debug!(program, args = %render_args(args), "running attached");
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| Self::spawn_error(program, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ToolFailed {
                program: program.to_owned(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }
}

/// Render a command line the way a user would paste it into a shell.
///
/// Arguments containing whitespace are wrapped in double quotes; everything
/// else is printed verbatim.
#[must_use]
pub fn render_command(program: &str, args: &[OsString]) -> String {
    let mut out = quote_arg(OsStr::new(program));
    for arg in args {
        out.push(' ');
        out.push_str(&quote_arg(arg));
    }
    out
}

fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| quote_arg(a))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &OsStr) -> String {
    let text = arg.to_string_lossy();
    if text.contains(char::is_whitespace) {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_render_command_quotes_whitespace() {
        let rendered = render_command(
            "ffmpeg",
            &os(&["-i", "my images/illus01.jpg", "-map", "[vout]"]),
        );
        assert_eq!(rendered, "ffmpeg -i \"my images/illus01.jpg\" -map [vout]");
    }

    #[test]
    fn test_missing_program_is_tool_not_found() {
        let err = SystemRunner
            .run("fna-definitely-not-a-real-binary", &[])
            .unwrap_err();
        assert!(matches!(err, MediaError::ToolNotFound(_)), "got: {err}");
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        assert!(!SystemRunner.is_available("fna-definitely-not-a-real-binary"));
    }
}
