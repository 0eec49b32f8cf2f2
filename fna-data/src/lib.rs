//! # fna-data
//!
//! Spreadsheet-to-JSON converters for the French Names Australia site.
//!
//! Two exports are handled:
//!
//! - the toponym gazetteer (`Toponymes1.csv`), split into one array per
//!   expedition (`entrecasteaux.json`, `baudin.json`);
//! - the Baudin chronology (`Historique Baudin.tsv`), turned into
//!   `timeline_baudin.json`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use fna_data::{ToponymConfig, convert_toponyms};
//!
//! let config = ToponymConfig::default().rooted_at(Path::new("site"));
//! let report = convert_toponyms(&config).unwrap();
//! println!("d'Entrecasteaux: {}", report.entrecasteaux_count);
//! println!("Baudin: {}", report.baudin_count);
//! ```

mod config;
mod error;
pub mod output;
mod timeline;
mod toponyms;

pub use config::{TimelineConfig, ToponymConfig};
pub use error::DataError;
pub use timeline::{TimelineEntry, convert_timeline, parse_date_iso, parse_decimal, parse_timeline};
pub use toponyms::{
    EXPEDITION_COLUMN, Expedition, Place, ToponymReport, ToponymSets, convert_toponyms,
    parse_coordinate, parse_toponyms, sniff_delimiter,
};
