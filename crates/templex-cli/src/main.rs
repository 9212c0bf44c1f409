//! CLI application for template-driven document data extraction.

mod commands;
mod input;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, process, templates};

/// Extract structured data from PDF, image and text documents
#[derive(Parser)]
#[command(name = "templex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Folder containing extraction templates in YAML
    #[arg(short, long, global = true)]
    template_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single document file
    Process(process::ProcessArgs),

    /// Process multiple document files
    Batch(batch::BatchArgs),

    /// Inspect and validate templates
    Templates(templates::TemplatesArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Process(args) => process::run(args, cli.template_folder.as_deref()),
        Commands::Batch(args) => batch::run(args, cli.template_folder.as_deref()),
        Commands::Templates(args) => templates::run(args, cli.template_folder.as_deref()),
    }
}
