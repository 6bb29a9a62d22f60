//! Screening CLI Module
//!
//! Operator commands for checking service status, training, screening a
//! single request and inspecting a dataset.

use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::bootstrap::{train_and_save, BootstrapOutcome, ScreeningService};
use crate::config::ScreeningConfig;
use crate::dataset::DatasetLoader;
use crate::inference::RiskLevel;
use crate::training::TrainingMetrics;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn risk_colored(risk: RiskLevel) -> ColoredString {
    match risk {
        RiskLevel::High => risk.as_str().red().bold(),
        RiskLevel::Moderate => risk.as_str().yellow().bold(),
        RiskLevel::Low => risk.as_str().green().bold(),
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "asd-screen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Questionnaire-based developmental screening")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bootstrap the service and report how the model was obtained
    Status,

    /// Train from the dataset and persist the model
    Train {
        /// Dataset CSV (overrides the configured path)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Model directory (overrides the configured directory)
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
    },

    /// Screen one request read from a JSON file
    Screen {
        /// JSON object with A1..A10, age_months, sex, jaundice, family_asd
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Validate a dataset and show its resolved schema
    Info {
        /// Dataset CSV
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Load the configuration file if one was given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ScreeningConfig> {
    Ok(match path {
        Some(p) => ScreeningConfig::from_file(p)?,
        None => ScreeningConfig::default(),
    })
}

fn print_metrics(metrics: &TrainingMetrics) {
    println!("  {:<16} {}", muted("Accuracy"), format!("{:.4}", metrics.accuracy).white().bold());
    println!("  {:<16} {}", muted("Precision (w)"), format!("{:.4}", metrics.precision).white());
    println!("  {:<16} {}", muted("Recall (w)"), format!("{:.4}", metrics.recall).white());
    println!("  {:<16} {}", muted("F1 (w)"), format!("{:.4}", metrics.f1_score).white());
    println!("  {:<16} {} / {}", muted("Train / test"), metrics.n_train, metrics.n_test);
    println!("  {:<16} {}", muted("Time"), format!("{:.3}s", metrics.training_time_secs).white());
}

// ─── Status ────────────────────────────────────────────────────────────────────

pub fn cmd_status(config: ScreeningConfig) -> anyhow::Result<()> {
    section("Status");

    step_run("Bootstrapping");
    let start = Instant::now();
    let service = ScreeningService::new(config)?;
    let outcome = service.bootstrap();
    step_done(&format!("{:?}", start.elapsed()));

    let engine = service.engine()?;
    println!();
    match &outcome {
        BootstrapOutcome::Loaded { pairing_id } => {
            println!("  {:<16} {}", muted("Outcome"), ok("loaded"));
            println!("  {:<16} {}", muted("Pairing id"), pairing_id);
        }
        BootstrapOutcome::Trained { metrics, pairing_id } => {
            println!("  {:<16} {}", muted("Outcome"), ok("trained"));
            match pairing_id {
                Some(id) => println!("  {:<16} {}", muted("Pairing id"), id),
                None => println!("  {:<16} {}", muted("Persisted"), "no".yellow()),
            }
            print_metrics(metrics);
        }
        BootstrapOutcome::Degraded { reason } => {
            println!("  {:<16} {}", muted("Outcome"), "degraded".yellow().bold());
            println!("  {:<16} {}", muted("Reason"), reason);
        }
    }
    println!("  {:<16} {}", muted("Model"), engine.model().kind());
    println!("  {:<16} {}", muted("Features"), engine.schema().join(", "));
    println!();
    Ok(())
}

// ─── Train ─────────────────────────────────────────────────────────────────────

pub fn cmd_train(
    mut config: ScreeningConfig,
    data: Option<PathBuf>,
    model_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    section("Train");

    if let Some(data) = data {
        config = config.with_dataset_path(data);
    }
    if let Some(dir) = model_dir {
        config = config.with_model_dir(dir);
    }
    config.validate()?;

    step_run(&format!("Training from {}", config.dataset_path.display().to_string().cyan()));
    let start = Instant::now();
    let (output, pairing_id) = train_and_save(&config)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    print_metrics(&output.metrics);
    println!("  {:<16} {}", muted("Features"), output.encoders.width());
    println!("  {:<16} {}", muted("Saved to"), config.model_dir.display());
    println!("  {:<16} {}", muted("Pairing id"), pairing_id);
    println!();
    Ok(())
}

// ─── Screen ────────────────────────────────────────────────────────────────────

pub fn cmd_screen(config: ScreeningConfig, input: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(input)?;
    let request = match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => map,
        other => anyhow::bail!("expected a JSON object, got {}", other),
    };

    let service = ScreeningService::new(config)?;
    let outcome = service.bootstrap();
    let analysis = service.analyze_behavioral_features(&request)?;

    eprintln!(
        "  {} risk {} (confidence {:.3}, model {})",
        accent("›"),
        risk_colored(analysis.result.risk),
        analysis.result.confidence,
        outcome.label()
    );
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

// ─── Info ──────────────────────────────────────────────────────────────────────

pub fn cmd_info(config: &ScreeningConfig, data_path: &Path) -> anyhow::Result<()> {
    section("Dataset Info");

    let loader = DatasetLoader::from_config(config)?;
    let dataset = loader.load(data_path)?;

    println!("  {:<16} {}", muted("File"), data_path.display());
    println!("  {:<16} {}", muted("Target"), dataset.schema.target_column);
    println!("  {:<16} {}", muted("Rows read"), dataset.rows_read);
    println!("  {:<16} {}", muted("Rows kept"), dataset.rows_kept());
    println!("  {:<16} {}", muted("Features"), dataset.schema.width());
    println!();

    println!("  {:<20} {:>8}", muted("Class"), muted("Rows"));
    println!("  {}", dim(&"─".repeat(30)));
    for (label, count) in dataset.class_counts()? {
        println!("  {:<20} {:>8}", label, count);
    }
    println!();

    println!("  {}", muted("Feature columns"));
    for column in &dataset.schema.feature_columns {
        println!("    {}", column);
    }
    println!();
    Ok(())
}
