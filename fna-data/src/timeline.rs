//! Baudin voyage chronology converter.
//!
//! The chronology spreadsheet is exported as TSV with French column names.
//! Each row becomes one timeline entry; ship columns hold an `X` when the
//! ship took part in the event.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::debug;

use crate::config::TimelineConfig;
use crate::error::DataError;
use crate::output::write_json_file;

/// Entry ids are spaced so hand-inserted events can slot in between.
const ID_STEP: u64 = 100;

const JSON_INDENT: usize = 2;

/// One event of the timeline as consumed by the map page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub id: u64,
    #[serde(rename = "dateISO")]
    pub date_iso: Option<String>,
    pub story: String,
    pub histoire: String,
    pub geographe: bool,
    pub naturaliste: bool,
    pub casuarina: bool,
    pub flinders: bool,
    #[serde(rename = "latitudeSouthDegrees")]
    pub latitude_south_degrees: String,
    #[serde(rename = "longitudeEastParisDegrees")]
    pub longitude_east_paris_degrees: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub interpolation: bool,
}

/// Parse a decimal that may use a comma separator. Blank or invalid → `None`.
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Convert a `dd/mm/yyyy` date to ISO-8601. Blank or invalid → `None`.
#[must_use]
pub fn parse_date_iso(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn is_marked(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("x")
}

/// Parse the chronology TSV.
///
/// # Errors
///
/// Returns [`DataError::MissingHeader`] for an empty file (reported against
/// `source`), or [`DataError::Csv`] if the reader rejects the input.
pub fn parse_timeline(text: &str, source: &Path) -> Result<Vec<TimelineEntry>, DataError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(DataError::MissingHeader(source.to_path_buf()));
    }

    let mut entries = Vec::new();
    for (index, record) in (1_u64..).zip(reader.records()) {
        let record = record?;
        let get = |column: &str| field(&headers, &record, column);

        // collapse -0.0 so the output never shows a signed zero
        let lat = parse_decimal(&get("Latitude Sud d\u{e9}cimale")).map(|v| v + 0.0);

        entries.push(TimelineEntry {
            id: index * ID_STEP,
            date_iso: parse_date_iso(&get("Date")),
            story: get("Story"),
            histoire: get("Histoire"),
            geographe: is_marked(&get("Le G\u{e9}ographe")),
            naturaliste: is_marked(&get("Le Naturaliste")),
            casuarina: is_marked(&get("Le Casuarina")),
            flinders: is_marked(&get("Flinders")),
            latitude_south_degrees: get("Latitude Sud degr\u{e9}s"),
            longitude_east_paris_degrees: get("Longitude Est (Paris) degr\u{e9}s"),
            lat,
            lon: parse_decimal(&get("Longitude Est (Greenwich) d\u{e9}cimale")),
            interpolation: is_marked(&get("Interpolation")),
        });
    }
    debug!(entries = entries.len(), "parsed timeline");
    Ok(entries)
}

/// Header lookup without trimming header names: the export's headers are exact.
fn field(headers: &StringRecord, record: &StringRecord, column: &str) -> String {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| *h == column)
        .map(|(i, _)| i)
        .last()
        .and_then(|i| record.get(i))
        .map(|v| v.trim().to_owned())
        .unwrap_or_default()
}

/// Convert the chronology TSV into the timeline JSON array.
///
/// Returns the number of entries written.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, or the output
/// cannot be written.
pub fn convert_timeline(config: &TimelineConfig) -> Result<usize, DataError> {
    let text = fs::read_to_string(&config.input).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            DataError::SourceNotFound(config.input.clone())
        } else {
            DataError::Io {
                path: config.input.clone(),
                source,
            }
        }
    })?;
    let entries = parse_timeline(&text, &config.input)?;
    write_json_file(&config.output, &entries, JSON_INDENT, true)?;
    Ok(entries.len())
}
