//! # fna-pages
//!
//! HTML page tools for the French Names Australia site:
//!
//! - [`format_details_dir`] rebuilds the legacy `details/` pages (names
//!   header, figures, main text, references) around a shared stylesheet;
//! - [`postprocess`] rebuilds a page exported from a word-processor
//!   document from the document's plain text;
//! - [`apply_patch`] runs one of the [`NavPatch`] text patches over the
//!   site pages;
//! - [`merge_report`] surveys the FR/EN resource page pairs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use fna_pages::{NavPatch, apply_patch};
//!
//! let report = apply_patch(NavPatch::UseInclude, Path::new("site"), &[]).unwrap();
//! println!("{} pages patched", report.modified.len());
//! ```

mod dom;
mod error;
mod legacy;
mod markup;
mod merge;
mod nav;
pub mod output;
mod postprocess;
mod report;

pub use error::PageError;
pub use legacy::{DetailsConfig, format_details_dir, format_legacy_page, template_style};
pub use markup::{escape, linkify};
pub use merge::{PAGE_PAIRS, PagePair, extract_main, extract_nav, extract_title, merge_report};
pub use nav::{
    ABOUT_ITEM, INCLUDE_PAGES, INCLUDE_PLACEHOLDER, MENU_PAGES, NAV_PARTIAL, NavPatch,
    RESOURCES_ITEM, STYLED_PAGES, add_about_menu, apply_patch, clean_nav_styles, inject_nav,
    load_nav_partial, remove_duplicate_about, remove_nav_styles, replace_nav_with_include,
};
pub use postprocess::{
    DOCUMENT_CSS, Sections, build_document, display_titles, document_title, extract_sections,
    merge_legends, postprocess, textutil_lines,
};
pub use report::{BatchReport, FileFailure, MergeReport, PairSummary};
