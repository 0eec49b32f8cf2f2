use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use fna_data::{TimelineConfig, ToponymConfig, convert_timeline, convert_toponyms};
use fna_media::{
    ConversionOutcome, IllustrationConfig, SlideshowConfig, SlideshowOutcome, ToolRunner,
    build_slideshow, run_conversion,
};
use fna_pages::output::{write_human, write_json, write_merge_human};
use fna_pages::{BatchReport, DetailsConfig, NavPatch, apply_patch, format_details_dir, merge_report};
use tracing::info;

use crate::cli::{Cli, Command, IllustrationsArgs, OutputFormat, SlideshowArgs};

/// Run one parsed command line. User-facing results go to `out`.
///
/// # Errors
///
/// Returns the first error of the command, or a summary error when a batch
/// finished with failed pages.
pub fn run(cli: Cli, runner: &dyn ToolRunner, out: &mut dyn Write) -> Result<()> {
    let root = cli.root.as_path();
    match cli.command {
        Command::Toponyms {
            input,
            entrecasteaux_out,
            baudin_out,
        } => {
            let mut config = ToponymConfig::default();
            override_path(&mut config.input, input);
            override_path(&mut config.entrecasteaux_out, entrecasteaux_out);
            override_path(&mut config.baudin_out, baudin_out);
            toponyms(&config.rooted_at(root), out)
        }
        Command::Timeline { input, output } => {
            let mut config = TimelineConfig::default();
            override_path(&mut config.input, input);
            override_path(&mut config.output, output);
            timeline(&config.rooted_at(root), out)
        }
        Command::FormatDetails {
            dir,
            template,
            ignore,
        } => {
            let mut config = DetailsConfig::default();
            override_path(&mut config.dir, dir);
            override_path(&mut config.template, template);
            if let Some(ignore) = ignore {
                config.ignore = ignore;
            }
            let report = format_details_dir(&config.rooted_at(root))?;
            emit_batch(&report, cli.format, out)
        }
        Command::Postprocess {
            source_doc,
            html_file,
        } => postprocess(&root.join(source_doc), &root.join(html_file), runner, out),
        Command::Nav { patch, files } => {
            let report = apply_patch(NavPatch::from(patch), root, &files)?;
            emit_batch(&report, cli.format, out)
        }
        Command::MergeReport => {
            let report = merge_report(root);
            match cli.format {
                OutputFormat::Human => write_merge_human(&report, out)?,
                OutputFormat::Json => write_json(&report, out)?,
            }
            if !report.ok() {
                bail!("merge-report: {} page(s) unreadable", report.failures.len());
            }
            Ok(())
        }
        Command::Illustrations(args) => illustrations(&args, root, runner, out),
        Command::Slideshow(args) => slideshow(&args, root, runner, out),
    }
}

fn override_path(slot: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn toponyms(config: &ToponymConfig, out: &mut dyn Write) -> Result<()> {
    let report = convert_toponyms(config)?;
    writeln!(
        out,
        "Succ\u{e8}s : {} g\u{e9}n\u{e9}r\u{e9} avec {} entr\u{e9}es.",
        report.entrecasteaux_path.display(),
        report.entrecasteaux_count
    )?;
    writeln!(
        out,
        "Succ\u{e8}s : {} g\u{e9}n\u{e9}r\u{e9} avec {} entr\u{e9}es.",
        report.baudin_path.display(),
        report.baudin_count
    )?;
    if report.coordinate_warnings > 0 {
        info!(
            count = report.coordinate_warnings,
            "records with invalid coordinates set to 0.0"
        );
    }
    Ok(())
}

fn timeline(config: &TimelineConfig, out: &mut dyn Write) -> Result<()> {
    let count = convert_timeline(config)?;
    writeln!(
        out,
        "OK: {} ({count} entr\u{e9}es)",
        config.output.display()
    )?;
    Ok(())
}

fn postprocess(
    source_doc: &Path,
    html_file: &Path,
    runner: &dyn ToolRunner,
    out: &mut dyn Write,
) -> Result<()> {
    fna_pages::postprocess(source_doc, html_file, runner)?;
    let name = html_file
        .file_name()
        .map_or_else(|| html_file.display().to_string(), |n| n.to_string_lossy().into_owned());
    writeln!(out, "[postprocess] Fichier mis \u{e0} jour : {name}")?;
    Ok(())
}

fn emit_batch(report: &BatchReport, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Human => write_human(report, out)?,
        OutputFormat::Json => write_json(report, out)?,
    }
    if !report.ok() {
        bail!(
            "{}: {} page(s) failed",
            report.operation,
            report.failures.len()
        );
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
}

fn illustrations(
    args: &IllustrationsArgs,
    root: &Path,
    runner: &dyn ToolRunner,
    out: &mut dyn Write,
) -> Result<()> {
    let mut config = IllustrationConfig::default();
    config.dir = root.join(&args.dir);
    config.prefix.clone_from(&args.prefix);
    config.quality = args.quality;
    config.progressive = !args.no_progressive;
    config.keep_markers = !args.no_keep_markers;
    config.dry_run = args.dry_run;

    match run_conversion(&config, runner)? {
        ConversionOutcome::NothingToDo => {
            writeln!(out, "No PNG files found in {}", config.dir.display())?;
        }
        ConversionOutcome::Planned(plan) => {
            for item in &plan {
                writeln!(
                    out,
                    "{} -> {}",
                    file_name(&item.source),
                    file_name(&item.destination)
                )?;
            }
        }
        ConversionOutcome::Converted(done) => {
            info!(count = done.len(), dir = %config.dir.display(), "illustrations converted");
        }
    }
    Ok(())
}

fn slideshow(
    args: &SlideshowArgs,
    root: &Path,
    runner: &dyn ToolRunner,
    out: &mut dyn Write,
) -> Result<()> {
    let mut config = SlideshowConfig::default();
    config.dir.clone_from(&args.dir);
    config.pattern.clone_from(&args.pattern);
    config.out.clone_from(&args.out);
    config.seconds = args.seconds;
    config.fade = args.fade;
    config.size.clone_from(&args.size);
    config.fps = args.fps;
    config.include_cover = args.include_cover;
    config.crf = args.crf;
    config.preset.clone_from(&args.preset);
    config.overwrite = args.overwrite;
    config.dry_run = args.dry_run;

    match build_slideshow(&config.rooted_at(root), runner)? {
        SlideshowOutcome::DryRun(command) => writeln!(out, "{command}")?,
        SlideshowOutcome::Rendered { output, images } => {
            info!(output = %output.display(), images, "slideshow rendered");
        }
    }
    Ok(())
}
