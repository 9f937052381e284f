//! Batch command - import multiple documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use actimp_core::document::file_extension;
use actimp_core::{ImportReport, Registry};

use super::load_config;
use super::output::{format_report, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input documents
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file (default: from configuration)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of importing a single file.
struct BatchResult {
    path: PathBuf,
    report: ImportReport,
    processing_time_ms: u64,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            config.accepts(&file_extension(name))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to import",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let registry = Registry::from_config(&config);
    let format = args
        .format
        .unwrap_or_else(|| OutputFormat::from_config(&config.output.format));

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let report = registry.import_file(&path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        if !report.successful {
            if args.continue_on_error {
                warn!("Failed to import {}: {}", path.display(), report.status.label());
            } else {
                error!("Failed to import {}: {}", path.display(), report.status.label());
                pb.abandon();
                anyhow::bail!(
                    "Import failed for {}: {} (status {})",
                    path.display(),
                    report.status.label(),
                    report.status.code()
                );
            }
        }

        if let Some(output_dir) = &args.output_dir {
            write_output(output_dir, &path, &report, format, config.output.pretty)?;
        }

        results.push(BatchResult {
            path,
            report,
            processing_time_ms,
        });
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| !r.report.successful).collect();
    let activities: usize = results.iter().map(|r| r.report.activities.len()).sum();

    println!();
    println!(
        "{} Imported {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} activities",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red(),
        activities
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {} (status {})",
                result.path.display(),
                result.report.status.label(),
                result.report.status.code()
            );
        }
    }

    Ok(())
}

fn write_output(
    output_dir: &Path,
    path: &Path,
    report: &ImportReport,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    let output_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    fs::write(&output_path, format_report(report, format, pretty)?)?;
    debug!("Wrote output to {}", output_path.display());

    Ok(())
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "successful",
        "activities",
        "processing_time_ms",
        "message",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let message = if result.report.successful {
            ""
        } else {
            result.report.status.label()
        };

        wtr.write_record([
            filename,
            &result.report.status.code().to_string(),
            &result.report.successful.to_string(),
            &result.report.activities.len().to_string(),
            &result.processing_time_ms.to_string(),
            message,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
