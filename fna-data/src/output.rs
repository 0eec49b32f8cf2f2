//! JSON array writer shared by the converters.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::DataError;

/// Serialize `value` with `indent` spaces per level.
///
/// Non-ASCII characters are emitted as-is; `serde_json` never escapes them.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_indented<T: Serialize + ?Sized>(
    value: &T,
    indent: usize,
) -> Result<String, DataError> {
    let indent_str = " ".repeat(indent);
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent_str.as_bytes());
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever produces UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `value` to `path`, creating parent directories first.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem operation fails.
pub fn write_json_file<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    indent: usize,
    trailing_newline: bool,
) -> Result<(), DataError> {
    let mut text = to_json_indented(value, indent)?;
    if trailing_newline {
        text.push('\n');
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| DataError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
