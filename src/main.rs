use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use survey_flow::config::EngineConfig;
use survey_flow::constants::CONTENT_TYPE_TEXT;
use survey_flow::flatten::flatten_value;
use survey_flow::flow_key;
use survey_flow::income::IncomeClassifier;
use survey_flow::logging;
use survey_flow::parser::text::parse_text_with;
use survey_flow::ContentDispatcher;

#[derive(Parser)]
#[command(name = "survey_flow")]
#[command(about = "Normalize questionnaires into flow-number mappings")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (overrides SURVEY_FLOW_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an uploaded questionnaire file into the canonical model
    Parse {
        path: PathBuf,
        /// Declared content type; guessed from the file extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Parse numbered question text using the configured parse scheme
    ParseText { path: PathBuf },
    /// Flatten a questionnaire JSON file into flow key to label pairs
    Flatten { path: PathBuf },
    /// Classify an income range such as "RM4,850 & below"
    Classify { text: String },
    /// Decompose a flow key such as FlowNo_2=3
    Decompose { key: String },
}

fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => "application/json",
        _ => CONTENT_TYPE_TEXT,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::from_env()?,
    };
    let _guard = logging::init_logging(config.logging.dir.as_deref());
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Parse { path, content_type } => {
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&path).to_string());
            let dispatcher = ContentDispatcher::new(config.text.upload_scheme);
            let outcome = dispatcher.process_file(&path, &content_type);
            if let Some(error) = outcome.error {
                bail!("{}", error);
            }
            if let Some(message) = outcome.message {
                eprintln!("{}", message);
            }
            print_json(&outcome.result)?;
        }
        Commands::ParseText { path } => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;
            let model = parse_text_with(&text, config.text.parse_scheme)?;
            print_json(&model)?;
        }
        Commands::Flatten { path } => {
            let bytes = fs::read(&path).with_context(|| format!("Cannot read '{}'", path.display()))?;
            let value: serde_json::Value = serde_json::from_slice(&bytes)
                .with_context(|| format!("'{}' is not valid JSON", path.display()))?;
            print_json(&flatten_value(&value)?)?;
        }
        Commands::Classify { text } => {
            let classifier = IncomeClassifier::new(config.income);
            print_json(&classifier.classify(&text)?)?;
        }
        Commands::Decompose { key } => {
            print_json(&flow_key::decompose(&key)?)?;
        }
    }
    Ok(())
}
