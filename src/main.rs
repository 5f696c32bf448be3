//! Aadhaar Shield - fraud detection for Aadhaar card images
//!
//! Detects the card, classifies it as real or fake and reads its identity
//! fields. Available as a desktop dashboard, a command line tool and a REST
//! API.

mod app;
mod config;
mod dashboard;
mod pipeline;
mod server;
mod shared;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::RwLock;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;
use crate::pipeline::batch::{export_csv, BATCH_CSV_NAME};
use crate::pipeline::{BatchSummary, FraudEngine};
use crate::shared::SharedAppState;
use crate::storage::outputs::{is_image_file, list_images};
use crate::vision::{ModelManager, ModelType, TesseractExtractor};

/// Aadhaar Shield - document fraud detection
#[derive(Parser, Debug)]
#[command(name = "aadhaar-shield", version)]
#[command(about = "Detects tampered Aadhaar card images and extracts their identity fields")]
struct Args {
    /// Configuration file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for crops, uploads and reports
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify a single document image
    Predict {
        /// Image to verify; prompts on stdin when omitted
        path: Option<PathBuf>,

        /// Print only the JSON result
        #[arg(long)]
        json: bool,
    },

    /// Verify several images (files or folders) in order
    Batch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write the results table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Clean up scans for OCR (blur, adaptive threshold, opening)
    Preprocess { input: PathBuf, output: PathBuf },

    /// Extract identity fields from every image in a folder (no fraud check)
    Ocr {
        input: PathBuf,

        /// Where the report and raw text files go (defaults to the output directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Inspect or fetch the detector and classifier models
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Run the REST API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Open the desktop dashboard (default)
    Dashboard,
}

#[derive(Subcommand, Debug)]
enum ModelsAction {
    /// Show where each model is expected and whether it is present
    Status,
    /// Download any missing model from its configured URL
    Download,
}

fn main() -> Result<()> {
    // Logs go to stderr so `predict --json` output stays parseable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let (file_config, config_path) = load_or_create_config(args.config.as_deref())?;
    let mut config = file_config.clone();
    if let Some(output_dir) = &args.output_dir {
        config.general.output_dir = output_dir.clone();
    }

    match args.command.unwrap_or(Command::Dashboard) {
        Command::Predict { path, json } => run_predict(&config, path, json),
        Command::Batch { paths, csv } => run_batch(&config, &paths, csv.as_deref()),
        Command::Preprocess { input, output } => {
            let written = vision::ocr_preprocess::preprocess_directory(
                &input,
                &output,
                &config.ocr.preprocessing,
            )?;
            println!("Preprocessed {written} image(s) into {}", output.display());
            Ok(())
        }
        Command::Ocr { input, output } => run_ocr(&config, &input, output),
        Command::Models { action } => run_models(&config, action),
        Command::Serve { host, port } => run_server(config, host, port),
        // The dashboard can save its settings, so it keeps the file's values
        Command::Dashboard => run_with_dashboard(file_config, config_path, args.output_dir),
    }
}

/// Load configuration from file or fall back to defaults.
///
/// Also returns the file later saves should go to: the explicit path, or the
/// default location.
fn load_or_create_config(explicit: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let config = config::load_config(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        return Ok((config, Some(path.to_path_buf())));
    }

    let config_path = storage::config_file_path().ok();
    if let Some(path) = config_path.as_deref().filter(|p| p.exists()) {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return Ok((config, config_path));
            }
            Err(e) => warn!("Ignoring unreadable configuration {:?}: {:#}", path, e),
        }
    }

    info!("Using default configuration");
    Ok((AppConfig::default(), config_path))
}

fn prompt_for_path() -> Result<PathBuf> {
    print!("Enter image path: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let line = line.trim().trim_matches('"');
    if line.is_empty() {
        anyhow::bail!("No image path given");
    }
    Ok(PathBuf::from(line))
}

fn run_predict(config: &AppConfig, path: Option<PathBuf>, json: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => prompt_for_path()?,
    };

    let mut engine = FraudEngine::from_config(config)?;
    let result = engine.predict(&path)?;
    let output = serde_json::to_string_pretty(&result)?;

    if json {
        println!("{output}");
    } else {
        println!("\n===== FINAL RESULT =====");
        println!("{output}");
        if !result.was_cropped() {
            println!("\nNo card region detected, the full image was classified");
        }
        if !result.ocr.has_aadhaar_number() {
            println!("No Aadhaar number found in the recognized text");
        }
        if result.fraud.needs_review(config.dashboard.confidence_threshold) {
            println!(
                "Confidence {:.1}% is below {:.0}%, manual review recommended",
                result.fraud.confidence * 100.0,
                config.dashboard.confidence_threshold * 100.0
            );
        }
    }
    Ok(())
}

/// Files are taken as given; folders contribute their images
fn expand_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            inputs.extend(
                list_images(path).with_context(|| format!("Failed to read {:?}", path))?,
            );
        } else {
            if !is_image_file(path) {
                warn!("{:?} does not look like a JPG/PNG image", path);
            }
            inputs.push(path.clone());
        }
    }
    Ok(inputs)
}

fn run_batch(config: &AppConfig, paths: &[PathBuf], csv: Option<&Path>) -> Result<()> {
    let inputs = expand_inputs(paths)?;
    if inputs.is_empty() {
        anyhow::bail!("No images to process");
    }

    let mut engine = FraudEngine::from_config(config)?;
    let items = engine.predict_batch(&inputs);

    let threshold = config.dashboard.confidence_threshold;
    let rows: Vec<_> = items.iter().map(|item| item.to_row(threshold)).collect();

    for row in &rows {
        println!(
            "{:<32} {:<8} {:>7}  {:<24} {:<12} {:<16} {}",
            row.document,
            row.status.as_str(),
            row.confidence,
            row.name,
            row.dob,
            row.aadhaar_number,
            row.details
        );
    }

    let summary = BatchSummary::from_rows(&rows);
    println!(
        "\nTotal: {}  Genuine: {}  Fraud: {}  Errors: {}  Fraud rate: {:.1}%",
        summary.total,
        summary.genuine,
        summary.fraud,
        summary.errors,
        summary.fraud_rate()
    );

    let csv_path = match csv {
        Some(path) => path.to_path_buf(),
        None => storage::OutputDir::new(&config.general.output_dir)?.export_path(BATCH_CSV_NAME),
    };
    export_csv(&csv_path, &rows)?;
    println!("Results saved to {}", csv_path.display());

    Ok(())
}

fn run_ocr(config: &AppConfig, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| config.general.output_dir.clone());
    let mut extractor = TesseractExtractor::new(config.ocr.clone())?;

    let results = pipeline::extraction::extract_directory(&mut extractor, input, &output)?;
    println!(
        "OCR extraction completed for {} image(s). Results saved in {}",
        results.len(),
        output.join(pipeline::extraction::OCR_CSV_NAME).display()
    );
    Ok(())
}

fn run_models(config: &AppConfig, action: ModelsAction) -> Result<()> {
    let manager = ModelManager::new(config.models.clone())?;

    match action {
        ModelsAction::Status => {
            let manifest = manager.load_manifest().unwrap_or_default();
            for status in manager.get_model_status() {
                let state = match status.size_bytes {
                    Some(size) if status.available => format!("present ({size} bytes)"),
                    _ => "missing".to_string(),
                };
                println!(
                    "{:<11} {:<22} {}",
                    status.model_type.display_name(),
                    state,
                    status.path.display()
                );

                let recorded = manifest
                    .models
                    .iter()
                    .find(|m| m.filename == status.model_type.filename())
                    .and_then(|m| m.sha256.as_deref());
                if let Some(sha256) = recorded {
                    println!("{:<11} sha256 {}", "", sha256);
                }
            }

            if !manager.are_models_ready() {
                println!("\nSome models are missing. Run `aadhaar-shield models download` or set their paths in the config.");
            }
        }
        ModelsAction::Download => {
            for model_type in ModelType::ALL {
                if manager.is_model_available(model_type) {
                    println!("{} model already present", model_type.display_name());
                    continue;
                }

                let name = model_type.display_name();
                manager.download_model_with_progress(
                    model_type,
                    Some(Box::new(move |done, total| match total {
                        Some(total) if total > 0 => {
                            eprint!("\r{name}: {:.0}%", done as f64 / total as f64 * 100.0)
                        }
                        _ => eprint!("\r{name}: {done} bytes"),
                    })),
                )?;
                eprintln!();
                println!(
                    "{} model saved to {}",
                    name,
                    manager.model_path(model_type).display()
                );
            }
        }
    }
    Ok(())
}

fn run_server(config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    // Models are fetched and loaded before the async runtime exists
    let engine = FraudEngine::from_config(&config)?;
    let models = ModelManager::new(config.models.clone())?.get_model_status();
    let state = server::AppState::new(engine, models);

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(server::serve(state, &host, port))
}

/// Run in dashboard mode
fn run_with_dashboard(
    config: AppConfig,
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    info!("Aadhaar Shield starting...");

    let mut state = SharedAppState::new(config).with_config_path(config_path);
    if let Some(dir) = output_dir {
        state.override_output_dir(dir);
    }
    let shared_state = Arc::new(RwLock::new(state));

    dashboard::run_dashboard(shared_state)
        .map_err(|e| anyhow::anyhow!("Dashboard error: {}", e))?;

    info!("Aadhaar Shield shutdown complete");
    Ok(())
}
