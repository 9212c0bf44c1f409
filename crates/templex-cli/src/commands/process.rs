//! Process command - extract data from a single document file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::bail;
use clap::Args;
use console::style;
use tracing::{debug, info};

use templex_core::{Extractor, read_templates};

use crate::input;
use crate::output;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, image or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Date format used for rendered date fields
    #[arg(long, default_value = "%Y-%m-%d")]
    output_date_format: String,
}

pub fn run(args: ProcessArgs, template_folder: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let Some(folder) = template_folder else {
        bail!("no template folder given, pass --template-folder");
    };
    if !args.input.exists() {
        bail!("input file not found: {}", args.input.display());
    }

    let templates = read_templates(folder)?;
    if templates.is_empty() {
        bail!("no templates found in {}", folder.display());
    }
    info!("loaded {} templates", templates.len());

    let extractor = Extractor::new(templates);

    let text = input::to_text(&args.input)?;
    if text.trim().is_empty() {
        bail!("no text could be extracted from {}", args.input.display());
    }

    let record = extractor
        .process(&text)
        .map_err(|err| anyhow::anyhow!("{}: {err}", args.input.display()))?;

    let mut value = output::record_to_json(&record, &args.output_date_format);
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(
            "file_name".to_string(),
            serde_json::Value::String(args.input.display().to_string()),
        );
    }

    let rendered = serde_json::to_string_pretty(&value)?;
    if let Some(path) = &args.output {
        fs::write(path, rendered)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            path.display()
        );
    } else {
        println!("{rendered}");
    }

    debug!("total processing time: {:?}", start.elapsed());

    Ok(())
}
