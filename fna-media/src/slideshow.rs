//! MP4 slideshow of the illustrations, rendered by `ffmpeg`.
//!
//! Every image is shown for a fixed time and crossfades into the next one.
//! This module only builds the `ffmpeg` invocation; encoding is left to
//! `ffmpeg` itself.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glob::Pattern;
use tracing::{debug, info};

use crate::error::MediaError;
use crate::tools::{ToolRunner, render_command};

/// Cover image left out of the slideshow unless asked for.
pub const COVER_IMAGE: &str = "illus00.jpg";

/// Output frame size, parsed from `WxH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for FrameSize {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MediaError::InvalidSize(s.to_owned());
        let lower = s.to_lowercase();
        let (w, h) = lower.split_once('x').ok_or_else(invalid)?;
        Ok(Self {
            width: w.trim().parse().map_err(|_| invalid())?,
            height: h.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Options of a slideshow run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SlideshowConfig {
    pub dir: PathBuf,
    /// Glob pattern, relative to `dir`.
    pub pattern: String,
    pub out: PathBuf,
    /// Seconds each image stays on screen.
    pub seconds: f64,
    /// Crossfade duration in seconds.
    pub fade: f64,
    /// Raw `WxH` size, validated by [`build_slideshow`].
    pub size: String,
    pub fps: u32,
    /// Keep [`COVER_IMAGE`] in the slideshow.
    pub include_cover: bool,
    /// x264 constant rate factor.
    pub crf: u32,
    /// x264 preset.
    pub preset: String,
    pub overwrite: bool,
    pub dry_run: bool,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("illustrations"),
            pattern: "illus*.jpg".to_owned(),
            out: PathBuf::from("illustrations/illustrations.mp4"),
            seconds: 3.0,
            fade: 0.30,
            size: "1080x1080".to_owned(),
            fps: 30,
            include_cover: false,
            crf: 18,
            preset: "medium".to_owned(),
            overwrite: false,
            dry_run: false,
        }
    }
}

impl SlideshowConfig {
    /// Resolve relative `dir` and `out` against `root`.
    #[must_use]
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.dir = root.join(&self.dir);
        self.out = root.join(&self.out);
        self
    }
}

/// Result of a slideshow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideshowOutcome {
    /// Dry run: the shell-quoted command line.
    DryRun(String),
    /// `ffmpeg` wrote the video.
    Rendered { output: PathBuf, images: usize },
}

/// Seconds as a short decimal that always carries a fractional part
/// (`3` → `3.0`, `0.3` → `0.3`).
fn format_seconds(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Build the `-filter_complex` graph for `n` inputs.
///
/// Inputs are letterboxed to `size`, chained with fade transitions and
/// resampled to `fps`; the final stream is labelled `[vout]`.
///
/// # Errors
///
/// Returns [`MediaError::InvalidTiming`] when `n` is zero or `fade` is not
/// strictly between zero and `seconds`.
pub fn build_filter(
    n: usize,
    size: FrameSize,
    seconds: f64,
    fade: f64,
    fps: u32,
) -> Result<String, MediaError> {
    if n < 1 {
        return Err(MediaError::InvalidTiming("need at least 1 image".to_owned()));
    }
    if fade <= 0.0 || fade >= seconds {
        return Err(MediaError::InvalidTiming(
            "fade must be > 0 and < seconds per image".to_owned(),
        ));
    }

    let FrameSize { width, height } = size;
    let step = seconds - fade;
    let fade_text = format_seconds(fade);

    let mut parts: Vec<String> = (0..n)
        .map(|i| {
            format!(
                "[{i}:v]scale={width}:{height}:force_original_aspect_ratio=decrease,\
                 pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,format=rgba,setsar=1[v{i}]"
            )
        })
        .collect();

    let mut prev = "v0".to_owned();
    for k in 1..n {
        #[allow(clippy::cast_precision_loss)]
        let offset = step * k as f64;
        let out = format!("x{k}");
        parts.push(format!(
            "[{prev}][v{k}]xfade=transition=fade:duration={fade_text}:offset={offset:.3}[{out}]"
        ));
        prev = out;
    }
    parts.push(format!("[{prev}]fps={fps},format=yuv420p[vout]"));
    Ok(parts.join(";"))
}

/// Images of the slideshow: files matching the pattern, sorted, without
/// the cover unless requested.
///
/// # Errors
///
/// Returns an error for a malformed pattern or when nothing matches.
pub fn collect_images(config: &SlideshowConfig) -> Result<Vec<PathBuf>, MediaError> {
    let dir = config.dir.to_string_lossy();
    let full = format!("{}/{}", Pattern::escape(&dir), config.pattern);
    let mut images: Vec<PathBuf> = glob::glob(&full)?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .filter(|p| config.include_cover || p.file_name().is_none_or(|n| n != COVER_IMAGE))
        .collect();
    images.sort();
    if images.is_empty() {
        return Err(MediaError::NoImages(
            config.dir.join(&config.pattern).display().to_string(),
        ));
    }
    Ok(images)
}

/// Assemble the full `ffmpeg` argument list (without the program name).
///
/// # Errors
///
/// Propagates [`build_filter`] errors.
pub fn ffmpeg_args(
    images: &[PathBuf],
    size: FrameSize,
    config: &SlideshowConfig,
) -> Result<Vec<OsString>, MediaError> {
    let graph = build_filter(images.len(), size, config.seconds, config.fade, config.fps)?;
    let seconds = format_seconds(config.seconds);

    let mut args: Vec<OsString> = Vec::with_capacity(images.len() * 6 + 16);
    args.push(if config.overwrite { "-y" } else { "-n" }.into());
    for img in images {
        args.extend(["-loop", "1", "-t"].map(OsString::from));
        args.push(OsString::from(&seconds));
        args.push(OsString::from("-i"));
        args.push(img.as_os_str().to_owned());
    }
    args.push(OsString::from("-filter_complex"));
    args.push(OsString::from(graph));
    args.extend(
        ["-map", "[vout]", "-an", "-c:v", "libx264", "-crf"].map(OsString::from),
    );
    args.push(OsString::from(config.crf.to_string()));
    args.push(OsString::from("-preset"));
    args.push(OsString::from(&config.preset));
    args.push(OsString::from("-movflags"));
    args.push(OsString::from("+faststart"));
    args.push(config.out.as_os_str().to_owned());
    Ok(args)
}

/// Check the environment, then render the slideshow (or print the command).
///
/// # Errors
///
/// Returns [`MediaError::ToolNotFound`] without `ffmpeg`,
/// [`MediaError::InvalidSize`], [`MediaError::NoImages`],
/// [`MediaError::OutputExists`] when the output would be clobbered, and any
/// `ffmpeg` failure.
pub fn build_slideshow(
    config: &SlideshowConfig,
    runner: &dyn ToolRunner,
) -> Result<SlideshowOutcome, MediaError> {
    if !runner.is_available("ffmpeg") {
        return Err(MediaError::ToolNotFound("ffmpeg".to_owned()));
    }
    let size: FrameSize = config.size.parse()?;
    let images = collect_images(config)?;
    debug!(count = images.len(), "slideshow images");

    if config.out.exists() && !config.overwrite {
        return Err(MediaError::OutputExists(config.out.clone()));
    }
    if let Some(parent) = config.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| MediaError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let args = ffmpeg_args(&images, size, config)?;
    if config.dry_run {
        return Ok(SlideshowOutcome::DryRun(render_command("ffmpeg", &args)));
    }

    runner.run_attached("ffmpeg", &args)?;
    info!(output = %config.out.display(), images = images.len(), "slideshow written");
    Ok(SlideshowOutcome::Rendered {
        output: config.out.clone(),
        images: images.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SQUARE: FrameSize = FrameSize {
        width: 1080,
        height: 1080,
    };

    #[test]
    fn test_frame_size_parse() {
        assert_eq!("1920X1080".parse::<FrameSize>().unwrap().to_string(), "1920x1080");
        assert!(matches!(
            "1080".parse::<FrameSize>(),
            Err(MediaError::InvalidSize(_))
        ));
        assert!("axb".parse::<FrameSize>().is_err());
        assert!("10x10x10".parse::<FrameSize>().is_err());
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(3.0), "3.0");
        assert_eq!(format_seconds(0.3), "0.3");
        assert_eq!(format_seconds(2.5), "2.5");
    }

    #[test]
    fn test_single_image_filter() {
        let graph = build_filter(1, SQUARE, 3.0, 0.3, 30).unwrap();
        assert_eq!(
            graph,
            "[0:v]scale=1080:1080:force_original_aspect_ratio=decrease,\
             pad=1080:1080:(ow-iw)/2:(oh-ih)/2,format=rgba,setsar=1[v0];\
             [v0]fps=30,format=yuv420p[vout]"
        );
    }

    #[test]
    fn test_crossfade_offsets() {
        let graph = build_filter(3, SQUARE, 3.0, 0.3, 30).unwrap();
        assert!(graph.contains("[v0][v1]xfade=transition=fade:duration=0.3:offset=2.700[x1]"));
        assert!(graph.contains("[x1][v2]xfade=transition=fade:duration=0.3:offset=5.400[x2]"));
        assert!(graph.ends_with("[x2]fps=30,format=yuv420p[vout]"));
        assert_eq!(graph.split(';').count(), 6);
    }

    #[test]
    fn test_invalid_timing() {
        assert!(build_filter(0, SQUARE, 3.0, 0.3, 30).is_err());
        assert!(build_filter(2, SQUARE, 3.0, 0.0, 30).is_err());
        assert!(build_filter(2, SQUARE, 3.0, 3.0, 30).is_err());
    }

    #[test]
    fn test_ffmpeg_args_layout() {
        let config = SlideshowConfig::default();
        let images = vec![
            PathBuf::from("illustrations/illus01.jpg"),
            PathBuf::from("illustrations/illus02.jpg"),
        ];
        let args = ffmpeg_args(&images, SQUARE, &config).unwrap();
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[0], "-n");
        assert_eq!(
            &args[1..7],
            ["-loop", "1", "-t", "3.0", "-i", "illustrations/illus01.jpg"]
        );
        assert_eq!(args[13], "-filter_complex");
        assert_eq!(
            &args[15..],
            [
                "-map",
                "[vout]",
                "-an",
                "-c:v",
                "libx264",
                "-crf",
                "18",
                "-preset",
                "medium",
                "-movflags",
                "+faststart",
                "illustrations/illustrations.mp4"
            ]
        );
    }
}
