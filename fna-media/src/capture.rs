//! Capture-time discovery for screenshots.
//!
//! Illustrations are renamed in the order they were captured. The time comes
//! from the first source that yields one: the file name (macOS screenshot
//! naming), embedded metadata via `exiftool`, then the file's own timestamps.

use std::ffi::OsString;
use std::path::Path;
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::debug;

use crate::error::MediaError;
use crate::tools::ToolRunner;

static CAPTURE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(
        r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2}).*?(?P<h>\d{2})[.:](?P<mi>\d{2})[.:](?P<s>\d{2})",
    ) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid capture name regex: {err}"),
    }
});

/// Metadata tags asked from `exiftool`, most specific first.
const EXIF_TAGS: &[&str] = &[
    "-DateTimeOriginal",
    "-CreateDate",
    "-MediaCreateDate",
    "-TrackCreateDate",
    "-ModifyDate",
];

const EXIF_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a capture time embedded in a file name such as
/// `Capture d'écran 2024-03-02 à 14.05.33.png`.
#[must_use]
pub fn capture_time_from_name(name: &str) -> Option<NaiveDateTime> {
    let caps = CAPTURE_NAME_PATTERN.captures(name)?;
    let num = |key: &str| caps.name(key)?.as_str().parse::<u32>().ok();
    let year = i32::try_from(num("y")?).ok()?;
    NaiveDate::from_ymd_opt(year, num("m")?, num("d")?)?.and_hms_opt(
        num("h")?,
        num("mi")?,
        num("s")?,
    )
}

/// Ask `exiftool` for the first date tag present in the file.
///
/// Returns `None` when `exiftool` is not installed, fails, or prints nothing
/// parseable.
#[must_use]
pub fn capture_time_from_metadata(path: &Path, runner: &dyn ToolRunner) -> Option<NaiveDateTime> {
    if !runner.is_available("exiftool") {
        return None;
    }
    let mut args: Vec<OsString> = vec!["-s3".into()];
    args.extend(EXIF_TAGS.iter().map(OsString::from));
    args.push(OsString::from("-d"));
    args.push(OsString::from(EXIF_DATE_FORMAT));
    args.push(path.as_os_str().to_owned());

    let output = match runner.run("exiftool", &args) {
        Ok(out) => out,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "exiftool gave no capture time");
            return None;
        }
    };
    output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .find_map(|l| NaiveDateTime::parse_from_str(l, EXIF_DATE_FORMAT).ok())
}

/// Creation time of the file, or its modification time where the platform
/// does not record creation.
///
/// # Errors
///
/// Returns an error if the file metadata cannot be read.
pub fn capture_time_from_file(path: &Path) -> Result<NaiveDateTime, MediaError> {
    let meta = std::fs::metadata(path).map_err(|source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let time: SystemTime = meta
        .created()
        .or_else(|_| meta.modified())
        .map_err(|source| MediaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(DateTime::<Local>::from(time).naive_local())
}

/// Best available capture time for `path`.
///
/// # Errors
///
/// Returns an error only when every source failed and the file metadata is
/// unreadable.
pub fn capture_time(path: &Path, runner: &dyn ToolRunner) -> Result<NaiveDateTime, MediaError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(t) = capture_time_from_name(&name) {
        return Ok(t);
    }
    if let Some(t) = capture_time_from_metadata(path, runner) {
        return Ok(t);
    }
    capture_time_from_file(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_macos_screenshot_name() {
        let t = capture_time_from_name("Capture d\u{2019}\u{e9}cran 2024-03-02 \u{e0} 14.05.33.png")
            .unwrap();
        assert_eq!(t.to_string(), "2024-03-02 14:05:33");
    }

    #[test]
    fn test_colon_separated_time() {
        let t = capture_time_from_name("Screenshot 2023-12-31 at 23:59:01.png").unwrap();
        assert_eq!(t.to_string(), "2023-12-31 23:59:01");
    }

    #[test]
    fn test_impossible_date_is_rejected() {
        assert!(capture_time_from_name("shot 2024-02-30 10.00.00.png").is_none());
        assert!(capture_time_from_name("shot 2024-01-01 25.00.00.png").is_none());
    }

    #[test]
    fn test_name_without_date() {
        assert!(capture_time_from_name("map.png").is_none());
    }

    #[test]
    fn test_file_time_fallback() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        assert!(capture_time_from_file(tmp.path()).is_ok());
    }
}
