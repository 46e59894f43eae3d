//! titleform: validate vehicle title data and produce the signed PDF

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use titleform_cli::AppConfig;
use titleform_core::HiddenFieldPolicy;
use titlepdf_core::{title_placements, PlacementRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "titleform_cli=info,titleform_core=info,titlepdf_core=info";

#[derive(Parser, Debug)]
#[command(name = "titleform")]
#[command(version, about = "Vehicle title application form engine")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the title registry as JSON
    Registry,

    /// Validate a values file and print errors and section progress
    Validate {
        /// JSON object keyed by field id
        #[arg(long)]
        values: PathBuf,

        /// What happens to errors of fields that are currently hidden
        #[arg(long, value_enum)]
        hidden_fields: Option<HiddenFields>,
    },

    /// List template fields and how each registry key resolves
    Fields {
        #[arg(long)]
        template: PathBuf,
    },

    /// Fill, sign and flatten the template
    Assemble {
        #[arg(long)]
        template: PathBuf,

        #[arg(long)]
        values: PathBuf,

        /// JSON array of {key, dataUrl}
        #[arg(long)]
        signatures: Option<PathBuf>,

        /// JSON array of signature placements; defaults to the title form's
        #[arg(long)]
        placements: Option<PathBuf>,

        #[arg(long)]
        out: PathBuf,

        /// Outline each signature placement box
        #[arg(long)]
        debug_outline: bool,

        /// Assemble even when validation fails
        #[arg(long)]
        allow_invalid: bool,
    },

    /// Print a page's widget fields projected into device space
    Overlay {
        #[arg(long)]
        template: PathBuf,

        /// 0-based page index
        #[arg(long, default_value = "0")]
        page: usize,

        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Override the page's own rotation (degrees)
        #[arg(long)]
        rotation: Option<i64>,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum HiddenFields {
    /// Hidden fields never carry an error
    Clear,
    /// Keep the error a field had when it was hidden
    Retain,
}

impl From<HiddenFields> for HiddenFieldPolicy {
    fn from(value: HiddenFields) -> Self {
        match value {
            HiddenFields::Clear => HiddenFieldPolicy::Clear,
            HiddenFields::Retain => HiddenFieldPolicy::Retain,
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    serde_json::from_slice(&read(path)?).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries command output; logs go to stderr
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_LOG_FILTER)?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env()?;

    match args.command {
        Command::Registry => {
            println!("{}", titleform_cli::registry_json()?);
        }
        Command::Validate { values, hidden_fields } => {
            if let Some(policy) = hidden_fields {
                config.hidden_fields = policy.into();
            }
            let report = titleform_cli::validate(&read_json(&values)?, &config)?;
            print_json(&report)?;
            if !report.is_valid {
                std::process::exit(1);
            }
        }
        Command::Fields { template } => {
            print_json(&titleform_cli::describe_fields(&read(&template)?)?)?;
        }
        Command::Assemble {
            template,
            values,
            signatures,
            placements,
            out,
            debug_outline,
            allow_invalid,
        } => {
            config.debug_outline |= debug_outline;
            let signatures = match signatures {
                Some(path) => {
                    let raw = read(&path)?;
                    titleform_cli::parse_signatures(&String::from_utf8_lossy(&raw))?
                }
                None => Vec::new(),
            };
            let placements = match placements {
                Some(path) => PlacementRegistry::from_json(&String::from_utf8_lossy(&read(&path)?))
                    .with_context(|| format!("Invalid placements in {}", path.display()))?,
                None => title_placements(),
            };
            let assembled = titleform_cli::assemble_document(
                &read(&template)?,
                &read_json(&values)?,
                signatures,
                placements,
                &config,
                allow_invalid,
            )?;
            fs::write(&out, &assembled.bytes).with_context(|| format!("Failed to write {}", out.display()))?;
            tracing::info!(out = %out.display(), "Wrote flattened document");
            print_json(&assembled.diagnostics)?;
        }
        Command::Overlay {
            template,
            page,
            scale,
            rotation,
        } => {
            let report = titleform_cli::overlay(&read(&template)?, page, scale, rotation).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
