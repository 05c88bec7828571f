//! Flight delay CLI module
//!
//! Command-line interface for training, batch prediction and serving.

use clap::{Args, Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::model::{train_test_split, DelayModel, DEFAULT_TARGET};
use crate::server::{run_server, ServerConfig};
use crate::training::ClassificationReport;
use crate::utils::{write_csv, DataLoader};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

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

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "flight-delay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Flight delay prediction for SCL airport")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// How input CSV files are read
#[derive(Args, Debug, Clone)]
pub struct CsvArgs {
    /// Field separator of the input CSV
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// Rows scanned to infer column types (default: the whole file)
    #[arg(long)]
    pub infer_schema_length: Option<usize>,
}

impl CsvArgs {
    pub fn loader(&self) -> anyhow::Result<DataLoader> {
        let delimiter = u8::try_from(self.delimiter)
            .map_err(|_| anyhow::anyhow!("delimiter must be a single-byte character, got {:?}", self.delimiter))?;
        let loader = DataLoader::new().with_delimiter(delimiter);
        Ok(match self.infer_schema_length {
            Some(rows) => loader.with_infer_schema_length(rows),
            None => loader,
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the delay model on raw flight records
    Train {
        /// Input CSV with OPERA, TIPOVUELO, MES and Fecha-I/Fecha-O (or a label column)
        #[arg(short, long)]
        data: PathBuf,

        /// Label column; computed from the timestamps when absent
        #[arg(short, long, default_value = DEFAULT_TARGET)]
        target: String,

        /// Where to write the trained model
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,

        /// Fraction of rows held out for evaluation (0 disables)
        #[arg(long, default_value = "0.33")]
        test_size: f64,

        /// Seed of the train/test shuffle
        #[arg(long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        csv: CsvArgs,
    },

    /// Make predictions using a trained model
    Predict {
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// Input CSV with OPERA, TIPOVUELO and MES
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV: the input with a `predict` column appended
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        csv: CsvArgs,
    },

    /// Start the prediction API
    Serve {
        /// Server port (default: API_PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host (default: API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Pre-trained model to serve (default: MODEL_PATH)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    loader: &DataLoader,
    data_path: &Path,
    target: &str,
    output: &Path,
    test_size: f64,
    seed: u64,
) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let df = loader.load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    let (train_df, test_df) = if test_size > 0.0 {
        let (train, test) = train_test_split(&df, test_size, seed)?;
        (train, Some(test))
    } else {
        (df, None)
    };

    let mut model = DelayModel::new();

    step_run("Encoding features");
    let start = Instant::now();
    let train = model.prepare_training_data(&train_df, target)?;
    step_done(&format!("{} rows in {:?}", train.n_rows(), start.elapsed()));

    step_run(&format!("Training {}", "gradient-boosted trees".cyan()));
    let start = Instant::now();
    model.fit(&train.features, &train.target)?;
    step_done(&format!("{:?}", start.elapsed()));

    if let Some(test_df) = test_df.filter(|t| t.height() > 0) {
        let test = model.prepare_training_data(&test_df, target)?;
        let predictions = model.predict(&test.features)?;
        let report = ClassificationReport::compute(&test.labels()?, &predictions);

        section(&format!("Evaluation ({} held-out rows)", test.n_rows()));
        for line in report.to_string().lines() {
            println!("  {}", line);
        }
    }

    if let Some(importances) = model.feature_importances() {
        section("Feature importance");
        for (name, importance) in importances {
            println!("  {:<30} {:.3}", name, importance);
        }
    }

    println!();
    model.save(output)?;
    step_ok(&format!("Model saved to {}", output.display()));
    Ok(())
}

pub fn cmd_predict(
    loader: &DataLoader,
    model_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let model = DelayModel::load(model_path)?;
    step_done(if model.is_trained() { "trained" } else { "untrained, predictions default to 0" });

    step_run("Loading data");
    let mut df = loader.load_csv(data_path)?;
    step_done(&format!("{} rows", df.height()));

    let features = model.prepare_inference_features(&df)?;
    let predictions = model.predict(&features)?;
    let delayed = predictions.iter().filter(|&&p| p == 1).count();
    step_ok(&format!("{} flights, {} predicted delayed", predictions.len(), delayed));

    match output {
        Some(path) => {
            df.with_column(Series::new("predict".into(), predictions))?;
            write_csv(&mut df, path)?;
            step_ok(&format!("Predictions written to {}", path.display()));
        }
        None => {
            for (row, prediction) in predictions.iter().enumerate() {
                println!("  {:>6}  {}", dim(&row.to_string()), prediction);
            }
        }
    }
    Ok(())
}

pub async fn cmd_serve(host: Option<String>, port: Option<u16>, model: Option<PathBuf>) -> anyhow::Result<()> {
    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        model_path: model.or(defaults.model_path),
    };
    run_server(config).await
}
