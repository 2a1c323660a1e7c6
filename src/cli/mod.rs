//! Diabeval CLI Module
//!
//! Command-line interface for evaluation runs, single predictions, and the
//! API server.

use clap::{Parser, Subcommand};
use colored::*;
use ndarray::{Array1, Axis};
use std::path::PathBuf;
use std::time::Instant;

use crate::data;
use crate::preprocessing::Preprocessor;
use crate::store::ModelStore;
use crate::training::{ClassifierKind, EvalEngine, ValidationStrategy};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).len();
    let pad = if visible_len < W { W - visible_len } else { 0 };
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).len();
    let total_pad = if visible_len < W { W - visible_len } else { 0 };
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

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
#[command(name = "diabeval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Binary classifier evaluation service for the diabetes dataset")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate all classifiers under one validation method
    Evaluate {
        /// Input dataset CSV
        #[arg(short, long, default_value = "diabetes.csv")]
        data: PathBuf,

        /// Validation method (holdout, 3-fold, 10-fold, leave-one-out)
        #[arg(short, long, default_value = "holdout")]
        method: String,

        /// Directory for persisted models
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,
    },

    /// Classify a single feature row
    Predict {
        /// Classifier name (knn, bayesian, svm, "neural network")
        #[arg(short, long)]
        model: String,

        /// Comma-separated feature values
        #[arg(short, long)]
        row: String,

        /// Input dataset CSV
        #[arg(short, long, default_value = "diabetes.csv")]
        data: PathBuf,

        /// Directory for persisted models
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,
    },

    /// Show dataset information
    Info {
        /// Input dataset CSV
        #[arg(short, long, default_value = "diabetes.csv")]
        data: PathBuf,
    },

    /// Start the API server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Input dataset CSV
        #[arg(short, long, default_value = "diabetes.csv")]
        data: String,

        /// Directory for persisted models
        #[arg(long, default_value = "models")]
        models_dir: String,
    },
}

fn parse_feature_row(raw: &str) -> anyhow::Result<Vec<f64>> {
    raw.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("Invalid feature value: {:?}", v.trim()))
        })
        .collect()
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_evaluate(data_path: &PathBuf, method: &str, models_dir: &PathBuf) -> anyhow::Result<()> {
    section("Evaluate");

    let strategy = ValidationStrategy::parse(method)?;

    step_run("Loading data");
    let start = Instant::now();
    let df = data::load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    step_run("Preprocessing");
    let start = Instant::now();
    let prepared = Preprocessor::new().fit_transform(&df)?;
    step_done(&format!("{} features in {:?}", prepared.n_features(), start.elapsed()));

    let store = ModelStore::new(models_dir)?;
    let engine = EvalEngine::new();

    step_run(&format!("Evaluating with {}", strategy.to_string().cyan()));
    let start = Instant::now();
    let results = engine.evaluate(&prepared.x, &prepared.y, strategy, &store)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!(
        "  {:<16} {:>9} {:>10} {:>8} {:>9} {:>8}",
        muted("Classifier"), muted("Accuracy"), muted("Precision"),
        muted("Recall"), muted("F1"), muted("ROC-AUC")
    );
    println!("  {}", dim(&"─".repeat(65)));

    for (name, metrics) in &results {
        let auc = match metrics.roc_auc {
            Some(v) => format!("{:.4}", v),
            None => "n/a".to_string(),
        };
        println!(
            "  {:<16} {:>9.4} {:>10.4} {:>8.4} {:>9.4} {:>8}",
            name, metrics.accuracy, metrics.precision, metrics.recall, metrics.f1_score, auc
        );
    }

    println!("  {}", dim(&"─".repeat(65)));

    if let Some((name, metrics)) = results.iter().max_by(|a, b| {
        a.1.accuracy
            .partial_cmp(&b.1.accuracy)
            .unwrap_or(std::cmp::Ordering::Equal)
    }) {
        println!();
        println!("  {} {} {} {:.4}",
            ok("best"),
            name.white().bold(),
            muted("accuracy:"),
            metrics.accuracy
        );
    }

    println!();
    println!("  {}", dim(&format!("models saved to {}", models_dir.display())));
    println!();
    Ok(())
}

pub fn cmd_predict(
    model: &str,
    row: &str,
    data_path: &PathBuf,
    models_dir: &PathBuf,
) -> anyhow::Result<()> {
    section("Predict");

    let kind = ClassifierKind::parse(model)?;
    let values = parse_feature_row(row)?;

    step_run("Loading data");
    let df = data::load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    step_run("Preprocessing");
    let prepared = Preprocessor::new().fit_transform(&df)?;
    step_done(&format!("{} features", prepared.n_features()));

    if values.len() != prepared.n_features() {
        anyhow::bail!(
            "Expected {} features, got {}",
            prepared.n_features(),
            values.len()
        );
    }

    let store = ModelStore::new(models_dir)?;
    let engine = EvalEngine::new();

    let stored = match store.load(kind.canonical_name()) {
        Ok(found) => found,
        Err(e) => {
            println!("  {} {}", "!".yellow(), dim(&format!("{}, retraining", e)));
            None
        }
    };

    let classifier = match stored {
        Some(classifier) => {
            step_ok(&format!("Loaded stored {}", kind.canonical_name()));
            classifier
        }
        None => {
            step_run(&format!("Training {}", kind.canonical_name().cyan()));
            let start = Instant::now();
            let classifier = engine.train_for_prediction(kind, &prepared.x, &prepared.y, &store)?;
            step_done(&format!("{:?}", start.elapsed()));
            classifier
        }
    };

    let scaled = prepared.scaler.transform_row(&Array1::from_vec(values))?;
    let x = scaled.insert_axis(Axis(0));

    // The neural network reports its raw sigmoid output, the rest a hard label.
    let prediction = match kind {
        ClassifierKind::NeuralNetwork => match classifier.predict_proba(&x)? {
            Some(proba) => proba[0],
            None => classifier.predict(&x)?[0],
        },
        _ => classifier.predict(&x)?[0],
    };

    println!();
    println!("  {:<12} {}", muted("Model"), kind.canonical_name().white().bold());
    println!("  {:<12} {}", muted("Prediction"), format!("{:.4}", prediction).white().bold());
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let df = data::load_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!("  {:<12} {:.2} MB", muted("Memory"), df.estimated_size() as f64 / 1024.0 / 1024.0);
    println!();

    println!("  {:<20} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
    println!("  {}", dim(&"─".repeat(50)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    if df.width() >= 2 {
        let (_, y, _) = data::split_features_labels(&df)?;
        let positives = y.iter().filter(|&&v| v > 0.5).count();
        let negatives = y.len() - positives;

        section("Labels");
        println!("  {:<12} {}", muted("Positive"), positives);
        println!("  {:<12} {}", muted("Negative"), negatives);
        println!(
            "  {:<12} {:.1}%",
            muted("Balance"),
            100.0 * positives as f64 / y.len() as f64
        );
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: &str, port: u16, data: &str, models_dir: &str) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Diabeval".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API    ", &format!("http://{}:{}/api", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box(&kv("Data   ", data));
    line_box(&kv("Models ", models_dir));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let config = ServerConfig {
        host: host.to_string(),
        port,
        data_path: data.to_string(),
        models_dir: models_dir.to_string(),
    };

    run_server(config).await
}
