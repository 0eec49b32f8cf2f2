//! Shared output formatting for page reports.
//!
//! Provides JSON and plain-text formatters for [`BatchReport`] and
//! [`MergeReport`]. Terminal colours belong to the CLI layer.

use std::io::Write;

use crate::report::{BatchReport, MergeReport};

/// Format any report as pretty JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<T: serde::Serialize>(report: &T, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format a [`BatchReport`] as human-readable plain text.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &BatchReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  {}", report.operation.to_uppercase())?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer)?;

    for path in &report.modified {
        writeln!(writer, "  \u{2713} {}", path.display())?;
    }
    for path in &report.unchanged {
        writeln!(writer, "  - {} (unchanged)", path.display())?;
    }
    for path in &report.missing {
        writeln!(writer, "  ! {} (not found, skipped)", path.display())?;
    }

    if !report.failures.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  FAILURES")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for failure in &report.failures {
            writeln!(writer, "{}", failure.format_human_readable())?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  Files modified: {}", report.modified.len())?;
    writeln!(writer, "  Unchanged:      {}", report.unchanged.len())?;
    writeln!(writer, "  Missing:        {}", report.missing.len())?;
    writeln!(writer, "  Failed:         {}", report.failures.len())?;
    writeln!(writer, "{}", "=".repeat(80))?;
    Ok(())
}

/// Format a [`MergeReport`] as human-readable plain text.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_merge_human(report: &MergeReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    for pair in &report.pairs {
        writeln!(
            writer,
            "{} + {} -> {}",
            pair.fr_file.display(),
            pair.en_file.display(),
            pair.output.display()
        )?;
        writeln!(writer, "  FR title: {}", pair.fr_title)?;
        writeln!(writer, "  EN title: {}", pair.en_title)?;
        writeln!(writer, "  FR main: {} chars", pair.fr_main_length)?;
        writeln!(writer, "  EN main: {} chars", pair.en_main_length)?;
        writeln!(writer)?;
    }
    for key in &report.missing {
        writeln!(writer, "\u{2717} missing files for {key}")?;
    }
    for failure in &report.failures {
        writeln!(writer, "\u{2717} {}", failure.format_human_readable())?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::report::FileFailure;

    #[test]
    fn test_human_output_lists_every_bucket() {
        let mut report = BatchReport::new("nav inject");
        report.modified.push(PathBuf::from("index.html"));
        report.missing.push(PathBuf::from("maps.html"));
        report
            .failures
            .push(FileFailure::new(PathBuf::from("x.html"), "boom".to_owned()));

        let mut out = Vec::new();
        write_human(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("NAV INJECT"));
        assert!(text.contains("index.html"));
        assert!(text.contains("maps.html (not found, skipped)"));
        assert!(text.contains("x.html: boom"));
        assert!(text.contains("Files modified: 1"));
    }

    #[test]
    fn test_json_output() {
        let report = BatchReport::new("format-details");
        let mut out = Vec::new();
        write_json(&report, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["operation"], "format-details");
        assert!(value["modified"].as_array().unwrap().is_empty());
    }
}
