//! Batch processing command for multiple document files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::bail;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use templex_core::{Extractor, read_templates};

use crate::input;
use crate::output;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Name for the combined output file (a .json extension is added)
    #[arg(short, long, default_value = "invoices-output")]
    output_name: PathBuf,

    /// Date format used for rendered date fields
    #[arg(long, default_value = "%Y-%m-%d")]
    output_date_format: String,

    /// Also generate a summary CSV next to the output file
    #[arg(long)]
    summary: bool,

    /// Stop at the first document that fails
    #[arg(long)]
    fail_fast: bool,
}

/// Result of processing a single file.
struct ProcessOutcome {
    path: PathBuf,
    record: Option<serde_json::Value>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub fn run(args: BatchArgs, template_folder: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let Some(folder) = template_folder else {
        bail!("no template folder given, pass --template-folder");
    };

    let templates = read_templates(folder)?;
    if templates.is_empty() {
        bail!("no templates found in {}", folder.display());
    }
    let extractor = Extractor::new(templates);

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|entry| entry.ok())
        .filter(|path| input::is_supported(path))
        .collect();

    if files.is_empty() {
        bail!("no matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let result = process_single_file(&path, &extractor, &args);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(record) => {
                outcomes.push(ProcessOutcome {
                    path,
                    record: Some(record),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(err) => {
                if args.fail_fast {
                    bail!("failed to process {}: {err}", path.display());
                }
                warn!("failed to process {}: {err}", path.display());
                outcomes.push(ProcessOutcome {
                    path,
                    record: None,
                    error: Some(err.to_string()),
                    processing_time_ms,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let records: Vec<serde_json::Value> = outcomes
        .iter()
        .filter_map(|outcome| outcome.record.clone())
        .collect();
    let written = output::write_json(&records, &args.output_name)?;
    println!(
        "{} {} records written to {}",
        style("✓").green(),
        records.len(),
        written.display()
    );

    if args.summary {
        let summary_path = written.with_extension("csv");
        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&ProcessOutcome> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(outcomes.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    extractor: &Extractor,
    args: &BatchArgs,
) -> anyhow::Result<serde_json::Value> {
    let text = input::to_text(path)?;
    if text.trim().is_empty() {
        bail!("no text could be extracted");
    }

    let record = extractor.process(&text)?;
    debug!("extracted {} fields from {}", record.len(), path.display());

    let mut value = output::record_to_json(&record, &args.output_date_format);
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(
            "file_name".to_string(),
            serde_json::Value::String(path.display().to_string()),
        );
    }
    Ok(value)
}

fn write_summary(path: &Path, outcomes: &[ProcessOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "issuer",
        "invoice_number",
        "date",
        "amount",
        "currency",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(record) = &outcome.record {
            let field = |key: &str| {
                record
                    .get(key)
                    .map(|value| match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default()
            };

            wtr.write_record([
                filename,
                "success",
                &field("issuer"),
                &field("invoice_number"),
                &field("date"),
                &field("amount"),
                &field("currency"),
                &outcome.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &outcome.processing_time_ms.to_string(),
                outcome.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
