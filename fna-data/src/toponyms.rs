//! Toponym gazetteer converter.
//!
//! Reads the spreadsheet export of French place names and splits it into one
//! JSON array per expedition, in the field layout the map pages expect.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ToponymConfig;
use crate::error::DataError;
use crate::output::write_json_file;

/// Column that decides which output array a row lands in.
pub const EXPEDITION_COLUMN: &str = "Expedition";

/// How many leading bytes are inspected to guess the delimiter.
const SNIFF_WINDOW: usize = 2048;

/// Delimiters tried by the sniffer, in order of preference.
const CANDIDATE_DELIMITERS: &[u8] = b",;\t|";

/// Output indentation of the expedition arrays.
const JSON_INDENT: usize = 4;

/// Expedition a toponym was named by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expedition {
    /// Bruni d'Entrecasteaux, 1791-1793.
    Entrecasteaux,
    /// Nicolas Baudin, 1800-1803.
    Baudin,
}

impl Expedition {
    /// Classify the raw `Expedition` cell. Unknown values return `None`.
    #[must_use]
    pub fn classify(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "d'entrecasteaux" | "entrecasteaux" => Some(Self::Entrecasteaux),
            "baudin" => Some(Self::Baudin),
            _ => None,
        }
    }
}

/// One gazetteer entry as published in `entrecasteaux.json` / `baudin.json`.
///
/// Field order is the serialization order; keep it stable so regenerated
/// files diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Place {
    pub code: String,
    pub expedition: String,
    pub state: String,
    #[serde(rename = "frenchName")]
    pub french_name: String,
    #[serde(rename = "variantName")]
    pub variant_name: String,
    #[serde(rename = "ausEName")]
    pub australian_name: String,
    #[serde(rename = "indigenousName")]
    pub indigenous_name: String,
    #[serde(rename = "indigenousLanguage")]
    pub indigenous_language: String,
    pub lat: f64,
    pub lon: f64,
    pub characteristic_fr: String,
    pub characteristic: String,
    pub history_fr: String,
    pub history: String,
    pub wiki_fr: String,
    pub wiki_en: String,
    #[serde(rename = "imgUrl")]
    pub img_url: String,
    pub other_link: String,
    #[serde(rename = "mapUrl")]
    pub map_url: String,
    #[serde(rename = "mapTitle_fr")]
    pub map_title_fr: String,
    #[serde(rename = "mapTitle_en")]
    pub map_title_en: String,
    pub origin_fr: String,
    #[serde(rename = "detailsLink")]
    pub details_link: String,
    #[serde(rename = "detailsLink_en")]
    pub details_link_en: String,
}

/// Places split by expedition, plus what was dropped along the way.
#[derive(Debug, Default)]
pub struct ToponymSets {
    pub entrecasteaux: Vec<Place>,
    pub baudin: Vec<Place>,
    /// Rows whose expedition matched neither voyage.
    pub unassigned: usize,
    /// Rows whose coordinates could not be parsed and were zeroed.
    pub coordinate_warnings: usize,
}

/// Outcome of [`convert_toponyms`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ToponymReport {
    pub entrecasteaux_path: PathBuf,
    pub entrecasteaux_count: usize,
    pub baudin_path: PathBuf,
    pub baudin_count: usize,
    pub unassigned: usize,
    pub coordinate_warnings: usize,
}

/// Row accessor keyed by trimmed header name. Later duplicate headers win.
struct Row<'a> {
    index: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn get(&self, column: &str) -> String {
        self.index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(|v| v.trim().to_owned())
            .unwrap_or_default()
    }
}

/// Guess the field delimiter from the head of the file.
///
/// A candidate qualifies when it appears the same, non-zero number of times
/// (outside quotes) on every complete line of the window; among qualifying
/// candidates the one splitting lines into the most fields wins. Returns
/// `None` when nothing qualifies.
#[must_use]
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let mut end = text.len().min(SNIFF_WINDOW);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let window = &text[..end];
    let mut lines: Vec<&str> = window.lines().filter(|l| !l.trim().is_empty()).collect();
    // the last line of a truncated window is usually cut mid-record
    if end < text.len() && lines.len() > 1 {
        lines.pop();
    }
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, usize)> = None;
    for &delim in CANDIDATE_DELIMITERS {
        let first = count_unquoted(lines[0], delim);
        if first == 0 {
            continue;
        }
        if lines.iter().all(|l| count_unquoted(l, delim) == first)
            && best.is_none_or(|(_, n)| first > n)
        {
            best = Some((delim, first));
        }
    }
    best.map(|(d, _)| d)
}

fn count_unquoted(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delim && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Parse a coordinate written with either a decimal comma or point.
///
/// Empty input is `Some(0.0)`; unparseable input is `None`.
#[must_use]
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return Some(0.0);
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the gazetteer text into per-expedition places.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] when no header is named `Expedition`,
/// or [`DataError::Csv`] if the reader rejects the input.
pub fn parse_toponyms(text: &str) -> Result<ToponymSets, DataError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = sniff_delimiter(text).unwrap_or(b',');
    debug!(delimiter = %char::from(delimiter).escape_default(), "sniffed delimiter");

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();
    if !headers.iter().any(|h| h == EXPEDITION_COLUMN) {
        return Err(DataError::MissingColumn {
            column: EXPEDITION_COLUMN.to_owned(),
            headers,
        });
    }
    let index: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), i))
        .collect();

    let mut sets = ToponymSets::default();
    for record in reader.records() {
        let record = record?;
        let row = Row {
            index: &index,
            record: &record,
        };
        let (place, coords_ok) = place_from_row(&row);
        if !coords_ok {
            sets.coordinate_warnings += 1;
        }
        match Expedition::classify(&place.expedition) {
            Some(Expedition::Entrecasteaux) => sets.entrecasteaux.push(place),
            Some(Expedition::Baudin) => sets.baudin.push(place),
            None => sets.unassigned += 1,
        }
    }
    Ok(sets)
}

fn place_from_row(row: &Row<'_>) -> (Place, bool) {
    let coords = parse_coordinate(&row.get("latitude South"))
        .zip(parse_coordinate(&row.get("longitude East")));
    let (lat, lon, coords_ok) = match coords {
        Some((lat, lon)) => (lat, lon, true),
        None => {
            let name = row.get("French name");
            let name = if name.is_empty() { "N/A".to_owned() } else { name };
            warn!(place = %name, "invalid coordinates, using 0.0");
            (0.0, 0.0, false)
        }
    };

    let place = Place {
        code: row.get("Code"),
        expedition: row.get(EXPEDITION_COLUMN),
        state: row.get("State"),
        french_name: row.get("French name"),
        variant_name: row.get("Variant and other historical name"),
        australian_name: row.get("Australian name"),
        indigenous_name: row.get("Aboriginal name"),
        indigenous_language: row.get("Aboriginal language group"),
        lat,
        lon,
        // the export really has two spaces before the language tag
        characteristic_fr: row.get("Caracteristiques  (FR)"),
        characteristic: row.get("Characteristic  (EN)"),
        history_fr: row.get("Histoire (FR)"),
        history: row.get("Story (EN)"),
        wiki_fr: row.get("URL WIKI FR"),
        wiki_en: row.get("URL WIKi EN"),
        img_url: row.get("URL IMG"),
        other_link: row.get("URL DIV"),
        map_url: row.get("URL Carte"),
        map_title_fr: row.get("Titre Carte (FR)"),
        map_title_en: row.get("Map title (EN)"),
        origin_fr: row.get("Origine du nom version initiale"),
        details_link: row.get("fiche detaillee F"),
        details_link_en: row.get("detailed information sheet E"),
    };
    (place, coords_ok)
}

/// Convert the gazetteer export into `entrecasteaux.json` and `baudin.json`.
///
/// Nothing is written unless the whole input parses.
///
/// # Errors
///
/// Returns [`DataError::SourceNotFound`] if the input is missing, and any
/// parse or write error otherwise.
pub fn convert_toponyms(config: &ToponymConfig) -> Result<ToponymReport, DataError> {
    if !config.input.exists() {
        return Err(DataError::SourceNotFound(config.input.clone()));
    }
    let text = fs::read_to_string(&config.input).map_err(|source| DataError::Io {
        path: config.input.clone(),
        source,
    })?;

    let sets = parse_toponyms(&text)?;
    if sets.unassigned > 0 {
        info!(rows = sets.unassigned, "rows with an unknown expedition were left out");
    }

    write_json_file(&config.entrecasteaux_out, &sets.entrecasteaux, JSON_INDENT, false)?;
    write_json_file(&config.baudin_out, &sets.baudin, JSON_INDENT, false)?;

    Ok(ToponymReport {
        entrecasteaux_path: config.entrecasteaux_out.clone(),
        entrecasteaux_count: sets.entrecasteaux.len(),
        baudin_path: config.baudin_out.clone(),
        baudin_count: sets.baudin.len(),
        unassigned: sets.unassigned,
        coordinate_warnings: sets.coordinate_warnings,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const HEADER: &str = "Code;Expedition;State;French name;latitude South;longitude East";

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let text = "a;b;c\n\"1,5\";x;y\n2;z,w;q\n";
        assert_eq!(sniff_delimiter(text), Some(b';'));
    }

    #[test]
    fn test_sniff_tab() {
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), Some(b'\t'));
    }

    #[test]
    fn test_sniff_gives_up_on_single_column() {
        assert_eq!(sniff_delimiter("only\nvalues\n"), None);
    }

    #[test]
    fn test_parse_coordinate_decimal_comma() {
        assert_eq!(parse_coordinate("-43,25"), Some(-43.25));
        assert_eq!(parse_coordinate("147.5"), Some(147.5));
        assert_eq!(parse_coordinate(""), Some(0.0));
        assert_eq!(parse_coordinate("43\u{b0}12'"), None);
        assert_eq!(parse_coordinate("nan"), None);
        assert_eq!(parse_coordinate("-inf"), None);
    }

    #[test]
    fn test_expedition_classification() {
        assert_eq!(
            Expedition::classify("D'Entrecasteaux"),
            Some(Expedition::Entrecasteaux)
        );
        assert_eq!(
            Expedition::classify("entrecasteaux"),
            Some(Expedition::Entrecasteaux)
        );
        assert_eq!(Expedition::classify(" Baudin "), Some(Expedition::Baudin));
        assert_eq!(Expedition::classify("Flinders"), None);
    }

    #[test]
    fn test_parse_buckets_rows() {
        let text = format!(
            "{HEADER}\nE1;d'Entrecasteaux;TAS;Baie de la Recherche;43,5;146,9\n\
             B1;Baudin;WA;Cap Naturaliste;33.5;115.0\n\
             F1;Flinders;SA;Kangaroo;35;137\n"
        );
        let sets = parse_toponyms(&text).unwrap();
        assert_eq!(sets.entrecasteaux.len(), 1);
        assert_eq!(sets.baudin.len(), 1);
        assert_eq!(sets.unassigned, 1);
        assert_eq!(sets.entrecasteaux[0].code, "E1");
        assert!((sets.entrecasteaux[0].lat - 43.5).abs() < 1e-9);
        assert!((sets.entrecasteaux[0].lon - 146.9).abs() < 1e-9);
    }

    #[test]
    fn test_bad_coordinate_zeroes_both() {
        let text = format!("{HEADER}\nB1;Baudin;WA;Cap Naturaliste;abc;115.0\n");
        let sets = parse_toponyms(&text).unwrap();
        assert_eq!(sets.coordinate_warnings, 1);
        let place = &sets.baudin[0];
        assert!(place.lat.abs() < f64::EPSILON);
        assert!(place.lon.abs() < f64::EPSILON);
    }

    #[test]
    fn test_headers_and_values_are_trimmed() {
        let text = "  Code , Expedition ,French name\n  X1 ,  Baudin , Ile Bernier \n";
        let sets = parse_toponyms(text).unwrap();
        assert_eq!(sets.baudin.len(), 1);
        assert_eq!(sets.baudin[0].code, "X1");
        assert_eq!(sets.baudin[0].expedition, "Baudin");
        assert_eq!(sets.baudin[0].french_name, "Ile Bernier");
    }

    #[test]
    fn test_missing_expedition_column() {
        let err = parse_toponyms("Code,State\n1,TAS\n").unwrap_err();
        match err {
            DataError::MissingColumn { column, headers } => {
                assert_eq!(column, "Expedition");
                assert_eq!(headers, vec!["Code".to_owned(), "State".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_place_serializes_in_site_field_order() {
        let text = serde_json::to_string(&Place::default()).unwrap();
        let order = [
            "\"code\"",
            "\"expedition\"",
            "\"frenchName\"",
            "\"ausEName\"",
            "\"lat\"",
            "\"characteristic_fr\"",
            "\"imgUrl\"",
            "\"mapTitle_en\"",
            "\"detailsLink_en\"",
        ];
        let positions: Vec<usize> = order.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "got: {text}");
        assert_eq!(text.matches("\":").count(), 24);
    }
}
