use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use fna_pages::NavPatch;

/// Content migration tools for the French Names Australia site.
#[derive(Debug, Parser)]
#[command(name = "fna", version, about)]
pub struct Cli {
    /// More log output (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Site root; relative paths are resolved against it.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Report format of the batch commands.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert the toponym spreadsheet into one JSON file per expedition.
    Toponyms {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        entrecasteaux_out: Option<PathBuf>,
        #[arg(long)]
        baudin_out: Option<PathBuf>,
    },
    /// Convert the Baudin chronology TSV into the timeline JSON.
    Timeline {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Rebuild the legacy detail pages in place.
    FormatDetails {
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Page whose `<style>` is copied into every rebuilt page.
        #[arg(long)]
        template: Option<PathBuf>,
        /// File names to leave untouched (replaces the default list).
        #[arg(long, num_args = 1..)]
        ignore: Option<Vec<String>>,
    },
    /// Rebuild an exported page from the text of its source document.
    Postprocess {
        source_doc: PathBuf,
        html_file: PathBuf,
    },
    /// Patch the navigation menu of the site pages.
    Nav {
        #[arg(value_enum)]
        patch: NavPatchArg,
        /// Pages to patch, relative to the root (default: the patch's page list).
        files: Vec<PathBuf>,
    },
    /// Survey the FR/EN resource page pairs. Writes nothing.
    MergeReport,
    /// Convert PNG screenshots into numbered progressive JPEGs.
    Illustrations(IllustrationsArgs),
    /// Render the illustrations into a crossfading MP4.
    Slideshow(SlideshowArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NavPatchArg {
    AddAbout,
    DedupeAbout,
    StripStyles,
    CleanStyles,
    UseInclude,
    Inject,
}

impl From<NavPatchArg> for NavPatch {
    fn from(arg: NavPatchArg) -> Self {
        match arg {
            NavPatchArg::AddAbout => Self::AddAbout,
            NavPatchArg::DedupeAbout => Self::DedupeAbout,
            NavPatchArg::StripStyles => Self::StripStyles,
            NavPatchArg::CleanStyles => Self::CleanStyles,
            NavPatchArg::UseInclude => Self::UseInclude,
            NavPatchArg::Inject => Self::Inject,
        }
    }
}

#[derive(Debug, Args)]
pub struct IllustrationsArgs {
    /// Directory of PNG screenshots.
    #[arg(default_value = "illustrations")]
    pub dir: PathBuf,
    #[arg(long, default_value = "illus")]
    pub prefix: String,
    /// JPEG quality, clamped to 1-100.
    #[arg(long, default_value_t = 90, allow_negative_numbers = true)]
    pub quality: i32,
    #[arg(long)]
    pub no_progressive: bool,
    /// Drop EXIF/ICC markers when re-encoding with jpegtran.
    #[arg(long)]
    pub no_keep_markers: bool,
    /// Print the renaming plan without touching any file.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct SlideshowArgs {
    #[arg(long, default_value = "illustrations")]
    pub dir: PathBuf,
    #[arg(long, default_value = "illus*.jpg")]
    pub pattern: String,
    #[arg(long, default_value = "illustrations/illustrations.mp4")]
    pub out: PathBuf,
    /// Seconds per image.
    #[arg(long, default_value_t = 3.0)]
    pub seconds: f64,
    /// Crossfade duration in seconds.
    #[arg(long, default_value_t = 0.30)]
    pub fade: f64,
    /// Frame size as `WxH`.
    #[arg(long, default_value = "1080x1080")]
    pub size: String,
    #[arg(long, default_value_t = 30)]
    pub fps: u32,
    /// Keep the cover image illus00.jpg.
    #[arg(long = "include-illus00")]
    pub include_cover: bool,
    #[arg(long, default_value_t = 18)]
    pub crf: u32,
    #[arg(long, default_value = "medium")]
    pub preset: String,
    #[arg(long)]
    pub overwrite: bool,
    /// Print the ffmpeg command instead of running it.
    #[arg(long)]
    pub dry_run: bool,
}
