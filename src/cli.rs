//! Command-line interface definitions and argument parsing

use clap::{Parser, Subcommand};

/// Cost-aware customer churn prediction and contact decisioning
#[derive(Parser, Debug)]
#[command(name = "churnguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train a churn model, pick the contact threshold, write artifacts
    Train {
        /// Path to the YAML run configuration
        #[arg(short, long, default_value = "configs/base.yaml")]
        config: String,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Score the held-out split with a saved model and emit curve data
    Evaluate {
        /// Path to the YAML run configuration
        #[arg(short, long, default_value = "configs/base.yaml")]
        config: String,

        /// Path to the model bundle (default: <artifacts_dir>/model.json)
        #[arg(short, long)]
        model: Option<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Score a feature-only CSV and write risk scores plus decisions
    Predict {
        /// Path to the model bundle
        #[arg(short, long)]
        model: String,

        /// CSV containing feature columns (no target column)
        #[arg(short, long)]
        input: String,

        /// Output CSV path
        #[arg(short, long, default_value = "artifacts/predictions.csv")]
        output: String,
    },
}
