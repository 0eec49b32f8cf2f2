//! # fna-media
//!
//! Illustration tooling for the French Names Australia site.
//!
//! - [`run_conversion`] turns the PNG screenshots of a directory into
//!   progressive JPEGs named `illus01.jpg`, `illus02.jpg`, ... in capture
//!   order, using `sips` and `jpegtran`.
//! - [`build_slideshow`] renders the JPEGs into a crossfading MP4 with
//!   `ffmpeg`.
//!
//! External programs are reached through the [`ToolRunner`] trait;
//! [`SystemRunner`] is the real implementation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fna_media::{SlideshowConfig, SlideshowOutcome, SystemRunner, build_slideshow};
//!
//! let mut config = SlideshowConfig::default();
//! config.dry_run = true;
//! if let SlideshowOutcome::DryRun(cmd) = build_slideshow(&config, &SystemRunner).unwrap() {
//!     println!("{cmd}");
//! }
//! ```

mod capture;
mod error;
mod illustrations;
mod slideshow;
pub mod tools;

pub use capture::{
    capture_time, capture_time_from_file, capture_time_from_metadata, capture_time_from_name,
};
pub use error::MediaError;
pub use illustrations::{
    ConversionOutcome, IllustrationConfig, PlannedConversion, convert_one, destination_name,
    find_pngs, plan_conversion, run_conversion,
};
pub use slideshow::{
    COVER_IMAGE, FrameSize, SlideshowConfig, SlideshowOutcome, build_filter, build_slideshow,
    collect_images, ffmpeg_args,
};
pub use tools::{SystemRunner, ToolOutput, ToolRunner, render_command};
