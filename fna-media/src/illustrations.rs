//! PNG screenshots to progressive JPEG, renamed by capture order.
//!
//! Planning and conversion are separate steps: the whole plan is computed
//! and checked for collisions before any file is touched, so a refused run
//! leaves the directory exactly as it was.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::capture::capture_time;
use crate::error::MediaError;
use crate::tools::ToolRunner;

/// Options of an illustration conversion run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct IllustrationConfig {
    /// Directory holding the PNG screenshots.
    pub dir: PathBuf,
    /// Output file name prefix (`illus` → `illus01.jpg`).
    pub prefix: String,
    /// JPEG quality; clamped to `1..=100` when used.
    pub quality: i32,
    /// Re-encode as progressive JPEG with `jpegtran`.
    pub progressive: bool,
    /// Keep all JPEG markers (EXIF, ICC) when running `jpegtran`.
    pub keep_markers: bool,
    /// Only compute and report the plan.
    pub dry_run: bool,
}

impl Default for IllustrationConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("illustrations"),
            prefix: "illus".to_owned(),
            quality: 90,
            progressive: true,
            keep_markers: true,
            dry_run: false,
        }
    }
}

impl IllustrationConfig {
    /// Quality actually passed to `sips`.
    #[must_use]
    pub fn effective_quality(&self) -> u8 {
        // clamped to 1..=100, so the conversion cannot fail
        u8::try_from(self.quality.clamp(1, 100)).unwrap_or(100)
    }
}

/// One source → destination pair of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedConversion {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub captured_at: NaiveDateTime,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The directory holds no PNG.
    NothingToDo,
    /// Dry run: the plan that would have been executed.
    Planned(Vec<PlannedConversion>),
    /// Every planned file was converted and its source removed.
    Converted(Vec<PlannedConversion>),
}

/// Regular files with a `.png` extension (any case), sorted by path.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn find_pngs(dir: &Path) -> Result<Vec<PathBuf>, MediaError> {
    let io_err = |source| MediaError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut pngs = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            pngs.push(path);
        }
    }
    pngs.sort();
    Ok(pngs)
}

/// File name for the `index`-th (1-based) image out of `count`.
///
/// Numbers are zero-padded to at least two digits, more when `count` needs it.
#[must_use]
pub fn destination_name(prefix: &str, index: usize, count: usize) -> String {
    let width = count.to_string().len().max(2);
    format!("{prefix}{index:0width$}.jpg")
}

/// Order the PNGs of `config.dir` by capture time and assign destinations.
///
/// # Errors
///
/// Returns [`MediaError::NotADirectory`] for a bad directory and
/// [`MediaError::Collisions`] when any destination already exists.
pub fn plan_conversion(
    config: &IllustrationConfig,
    runner: &dyn ToolRunner,
) -> Result<Vec<PlannedConversion>, MediaError> {
    if !config.dir.is_dir() {
        return Err(MediaError::NotADirectory(config.dir.clone()));
    }

    let mut timed = Vec::new();
    for path in find_pngs(&config.dir)? {
        let captured_at = capture_time(&path, runner)?;
        debug!(path = %path.display(), %captured_at, "capture time");
        timed.push((captured_at, path));
    }
    timed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.file_name().cmp(&b.1.file_name())));

    let count = timed.len();
    let plan: Vec<PlannedConversion> = timed
        .into_iter()
        .enumerate()
        .map(|(i, (captured_at, source))| PlannedConversion {
            destination: config
                .dir
                .join(destination_name(&config.prefix, i + 1, count)),
            source,
            captured_at,
        })
        .collect();

    let collisions: Vec<PathBuf> = plan
        .iter()
        .filter(|p| p.destination.exists())
        .map(|p| p.destination.clone())
        .collect();
    if !collisions.is_empty() {
        return Err(MediaError::Collisions(collisions));
    }
    Ok(plan)
}

/// Temporary conversion output, removed on drop unless it was renamed away.
struct TempOutput {
    path: PathBuf,
}

impl TempOutput {
    fn new(path: PathBuf) -> Result<Self, MediaError> {
        remove_if_exists(&path)?;
        Ok(Self { path })
    }
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<(), MediaError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(MediaError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn rename(from: &Path, to: &Path) -> Result<(), MediaError> {
    fs::rename(from, to).map_err(|source| MediaError::Io {
        path: from.to_path_buf(),
        source,
    })
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Convert one PNG into `dst` with `sips`, optionally made progressive by
/// `jpegtran`. The source is left in place.
///
/// # Errors
///
/// Returns an error if `dst` exists, a tool is missing or fails, or the
/// converted file is empty.
pub fn convert_one(
    src: &Path,
    dst: &Path,
    config: &IllustrationConfig,
    runner: &dyn ToolRunner,
) -> Result<(), MediaError> {
    if dst.exists() {
        return Err(MediaError::DestinationExists(dst.to_path_buf()));
    }
    let tmp = TempOutput::new(with_appended_extension(dst, "tmp"))?;

    let quality = config.effective_quality().to_string();
    let sips_args: Vec<OsString> = vec![
        "-s".into(),
        "format".into(),
        "jpeg".into(),
        "-s".into(),
        "formatOptions".into(),
        quality.into(),
        src.as_os_str().to_owned(),
        "--out".into(),
        tmp.path.as_os_str().to_owned(),
    ];
    runner.run("sips", &sips_args)?;

    if config.progressive {
        if !runner.is_available("jpegtran") {
            return Err(MediaError::ToolNotFound("jpegtran".to_owned()));
        }
        let progressive = TempOutput::new(tmp.path.with_extension("prog.jpg"))?;
        let copy_mode = if config.keep_markers { "all" } else { "none" };
        let jpegtran_args: Vec<OsString> = vec![
            "-optimize".into(),
            "-progressive".into(),
            "-copy".into(),
            copy_mode.into(),
            "-outfile".into(),
            progressive.path.as_os_str().to_owned(),
            tmp.path.as_os_str().to_owned(),
        ];
        runner.run("jpegtran", &jpegtran_args)?;
        remove_if_exists(&tmp.path)?;
        rename(&progressive.path, &tmp.path)?;
    }

    let converted_len = fs::metadata(&tmp.path).map(|m| m.len()).unwrap_or(0);
    if converted_len == 0 {
        return Err(MediaError::ConversionFailed(src.to_path_buf()));
    }
    rename(&tmp.path, dst)
}

/// Plan, then convert every PNG of `config.dir` and delete the sources.
///
/// # Errors
///
/// Returns the planning error, or the first conversion failure. Files
/// converted before a failure stay converted.
pub fn run_conversion(
    config: &IllustrationConfig,
    runner: &dyn ToolRunner,
) -> Result<ConversionOutcome, MediaError> {
    let plan = plan_conversion(config, runner)?;
    if plan.is_empty() {
        return Ok(ConversionOutcome::NothingToDo);
    }
    if config.dry_run {
        return Ok(ConversionOutcome::Planned(plan));
    }

    for item in &plan {
        convert_one(&item.source, &item.destination, config, runner)?;
        fs::remove_file(&item.source).map_err(|source| MediaError::Io {
            path: item.source.clone(),
            source,
        })?;
        info!(
            source = %item.source.display(),
            destination = %item.destination.display(),
            "converted"
        );
    }
    Ok(ConversionOutcome::Converted(plan))
}
