//! Config command - inspect and write the importer configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use actimp_core::ImporterConfig;

use super::output::OutputFormat;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective import settings
    Show {
        /// Print the configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a configuration file
    Init(InitArgs),

    /// Print the configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Accepted file extension (repeatable, replaces the defaults)
    #[arg(short, long = "extension", value_name = "EXT")]
    extensions: Vec<String>,

    /// Column delimiter of delimited-text documents
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Default report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON reports by default
    #[arg(long)]
    pretty: bool,

    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config_path = config_path.map(PathBuf::from).unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show { json } => show_config(&config_path, json),
        ConfigCommand::Init(init_args) => init_config(init_args, config_path),
        ConfigCommand::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("actimp")
        .join("config.json")
}

fn show_config(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let (config, source) = if config_path.exists() {
        (ImporterConfig::from_file(config_path)?, config_path.display().to_string())
    } else {
        (ImporterConfig::default(), "defaults".to_string())
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Source: {}", style(source).dim());
    println!(
        "Accepted extensions: {}",
        config.document.accepted_extensions.join(", ")
    );
    println!("Delimiter: '{}'", config.document.delimiter);
    println!(
        "Report format: {}{}",
        config.output.format,
        if config.output.pretty { " (pretty)" } else { "" }
    );

    Ok(())
}

fn init_config(args: InitArgs, config_path: PathBuf) -> anyhow::Result<()> {
    let output_path = args.output.clone().unwrap_or(config_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    let config = build_config(&args)?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(&output_path)?;

    println!(
        "{} Created configuration file at {} (extensions: {})",
        style("✓").green(),
        output_path.display(),
        config.document.accepted_extensions.join(", ")
    );

    Ok(())
}

fn build_config(args: &InitArgs) -> anyhow::Result<ImporterConfig> {
    let mut config = ImporterConfig::default();

    if !args.extensions.is_empty() {
        let mut extensions: Vec<String> = Vec::new();
        for raw in &args.extensions {
            let extension = raw.trim().trim_start_matches('.').to_ascii_lowercase();
            if extension.is_empty() {
                anyhow::bail!("Empty file extension '{}'", raw);
            }
            if !extensions.contains(&extension) {
                extensions.push(extension);
            }
        }
        config.document.accepted_extensions = extensions;
    }

    if let Some(delimiter) = args.delimiter {
        // Delimited rows are split on a single byte.
        if !delimiter.is_ascii() {
            anyhow::bail!("Delimiter '{}' is not an ASCII character", delimiter);
        }
        config.document.delimiter = delimiter;
    }

    if let Some(format) = args.format {
        config.output.format = format.name().to_string();
    }
    config.output.pretty = args.pretty;

    Ok(config)
}
