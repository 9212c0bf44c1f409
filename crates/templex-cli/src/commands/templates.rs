//! Templates command - inspect and validate template folders.

use std::fs;
use std::path::Path;

use anyhow::bail;
use clap::{Args, Subcommand};
use console::style;

use templex_core::{parse_template, read_templates, template_files};

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List loadable templates in precedence order
    List,

    /// Validate every template file and report errors
    Check,
}

pub fn run(args: TemplatesArgs, template_folder: Option<&Path>) -> anyhow::Result<()> {
    let Some(folder) = template_folder else {
        bail!("no template folder given, pass --template-folder");
    };

    match args.command {
        TemplatesCommand::List => list(folder),
        TemplatesCommand::Check => check(folder),
    }
}

fn list(folder: &Path) -> anyhow::Result<()> {
    let templates = read_templates(folder)?;
    if templates.is_empty() {
        println!("no templates found in {}", folder.display());
        return Ok(());
    }

    for template in &templates {
        println!(
            "{} {}",
            style(&template.name).bold(),
            style(format!(
                "issuer: {}, {} keywords, {} fields",
                template.issuer,
                template.keywords.len(),
                template.fields.len()
            ))
            .dim()
        );
    }

    Ok(())
}

fn check(folder: &Path) -> anyhow::Result<()> {
    let files = template_files(folder)?;
    if files.is_empty() {
        bail!("no template files found in {}", folder.display());
    }

    let mut failures = 0usize;
    for path in &files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        let parsed = fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|source| parse_template(name, &source).map_err(anyhow::Error::from));

        match parsed {
            Ok(_) => println!("{} {}", style("✓").green(), name),
            Err(err) => {
                failures += 1;
                println!("{} {}: {err}", style("✗").red(), name);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} invalid template file(s)");
    }
    println!();
    println!("{} {} templates valid", style("✓").green(), files.len());
    Ok(())
}
