//! ChurnGuard: cost-aware churn prediction CLI
//!
//! This is the main entrypoint that orchestrates training, evaluation, and
//! batch prediction around the metrics and decision core.

use anyhow::Result;
use churnguard::{
    build_model, calibration_curve, clean, load_csv, pick_threshold, roc_curve, split_stratified,
    ChurnModel, ChurnPipeline, Cli, Command, Config, DecisionPolicy, MetricReport, Preprocessor,
    ProbabilityModel, TrainingReport,
};
use clap::Parser;
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Train { config, verbose } => run_train(&config, verbose),
        Command::Evaluate {
            config,
            model,
            verbose,
        } => run_evaluate(&config, model.as_deref(), verbose),
        Command::Predict {
            model,
            input,
            output,
        } => run_predict(&model, &input, &output),
    }
}

/// Full training pipeline: clean, split, fit, evaluate, pick threshold,
/// write artifacts.
fn run_train(config_path: &str, verbose: bool) -> Result<()> {
    println!("=== Training Pipeline ===\n");
    let start_time = Instant::now();

    let cfg = Config::load(Path::new(config_path))?;

    if verbose {
        println!("Step 1: Loading and cleaning data");
        println!("  Input file: {}", cfg.data.csv_path);
    }
    let data_start = Instant::now();
    let df = load_csv(&cfg.data.csv_path)?;
    let (x, y) = clean(&df, &cfg.data.target_col, &cfg.data.drop_cols)?;
    println!("✓ Data loaded: {} customers", x.height());
    if verbose {
        println!("  Processing time: {:.2}s", data_start.elapsed().as_secs_f64());
        println!(
            "  Churn rate: {:.1}%",
            y.iter().filter(|&&v| v == 1).count() as f64 / y.len() as f64 * 100.0
        );
    }

    if verbose {
        println!("\nStep 2: Stratified split");
        println!("  Test size: {}", cfg.split.test_size);
        println!("  Random state: {}", cfg.split.random_state);
    }
    let split = split_stratified(&x, &y, cfg.split.test_size, cfg.split.random_state)?;
    println!(
        "✓ Split: {} train / {} test",
        split.y_train.len(),
        split.y_test.len()
    );

    if verbose {
        println!("\nStep 3: Fitting model");
        println!("  Model: {}", cfg.model.name);
        println!("  Max iterations: {}", cfg.model.max_iter);
    }
    let fit_start = Instant::now();
    build_model(&cfg.model.name)?;
    let preprocessor = Preprocessor::fit(&split.x_train)?;
    let x_train = preprocessor.transform(&split.x_train)?;
    let model = ChurnModel::fit(
        &x_train,
        &split.y_train,
        preprocessor.feature_names(),
        cfg.model.max_iter,
    )?;
    println!("✓ Model fitted successfully");
    if verbose {
        println!("  Fitting time: {:.2}s", fit_start.elapsed().as_secs_f64());
        println!("  Features: {}", preprocessor.width());
    }

    if verbose {
        println!("\nStep 4: Evaluating on held-out split");
    }
    let x_test = preprocessor.transform(&split.x_test)?;
    let probabilities = model.predict_probability(&x_test)?;
    let metrics = MetricReport::from_scores(&split.y_test, &probabilities)?;
    let decision = pick_threshold(&split.y_test, &probabilities, &cfg.cost)?;

    let artifacts_dir = Path::new(&cfg.outputs.artifacts_dir);
    let model_path = artifacts_dir.join("model.json");
    let report_path = artifacts_dir.join("metrics.json");

    let pipeline = ChurnPipeline {
        preprocessor,
        model,
        decision,
    };
    pipeline.save(&model_path)?;
    TrainingReport::new(&metrics, &decision, &cfg).save(&report_path)?;

    println!("✓ Saved: {}", model_path.display());
    println!("✓ Saved: {}", report_path.display());
    println!(
        "\nROC-AUC={:.4}  PR-AUC={:.4}  Brier={:.4}",
        metrics.roc_auc, metrics.pr_auc, metrics.brier
    );
    println!(
        "Threshold suggestion: threshold={:.2}, utility={:.2}",
        decision.threshold, decision.utility
    );
    println!(
        "\nTotal processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Re-derive the held-out split, score it with a saved bundle, and write
/// ROC and calibration curve data for an external renderer.
fn run_evaluate(config_path: &str, model_path: Option<&str>, verbose: bool) -> Result<()> {
    println!("=== Evaluation ===\n");

    let cfg = Config::load(Path::new(config_path))?;
    let model_path = model_path
        .map(|p| p.to_string())
        .unwrap_or_else(|| format!("{}/model.json", cfg.outputs.artifacts_dir));

    if verbose {
        println!("Loading data from: {}", cfg.data.csv_path);
    }
    let df = load_csv(&cfg.data.csv_path)?;
    let (x, y) = clean(&df, &cfg.data.target_col, &cfg.data.drop_cols)?;
    // Same test_size and random_state as training, so this is the same
    // test partition the model was evaluated on.
    let split = split_stratified(&x, &y, cfg.split.test_size, cfg.split.random_state)?;

    if verbose {
        println!("Loading model from: {}", model_path);
    }
    let pipeline = ChurnPipeline::load(Path::new(&model_path))?;
    let probabilities = pipeline.predict_probability(&split.x_test)?;
    let metrics = MetricReport::from_scores(&split.y_test, &probabilities)?;

    println!(
        "ROC-AUC={:.4}  PR-AUC={:.4}  Brier={:.4}",
        metrics.roc_auc, metrics.pr_auc, metrics.brier
    );
    println!(
        "Stored operating point: threshold={:.2}, utility={:.2}",
        pipeline.decision.threshold, pipeline.decision.utility
    );

    let curves_dir = Path::new(&cfg.outputs.curves_dir);
    std::fs::create_dir_all(curves_dir)?;

    let roc = roc_curve(&split.y_test, &probabilities)?;
    let mut roc_df = DataFrame::new(vec![
        Series::new("threshold", roc.iter().map(|p| p.threshold).collect::<Vec<_>>()),
        Series::new("fpr", roc.iter().map(|p| p.fpr).collect::<Vec<_>>()),
        Series::new("tpr", roc.iter().map(|p| p.tpr).collect::<Vec<_>>()),
    ])?;
    let roc_path = curves_dir.join("roc_curve.csv");
    write_csv(&mut roc_df, &roc_path)?;
    println!("✓ Wrote: {}", roc_path.display());

    let calibration = calibration_curve(&split.y_test, &probabilities, 10)?;
    let mut cal_df = DataFrame::new(vec![
        Series::new(
            "mean_predicted",
            calibration.iter().map(|b| b.mean_predicted).collect::<Vec<_>>(),
        ),
        Series::new(
            "fraction_positive",
            calibration
                .iter()
                .map(|b| b.fraction_positive)
                .collect::<Vec<_>>(),
        ),
        Series::new(
            "count",
            calibration.iter().map(|b| b.count as u32).collect::<Vec<_>>(),
        ),
    ])?;
    let cal_path = curves_dir.join("calibration_curve.csv");
    write_csv(&mut cal_df, &cal_path)?;
    println!("✓ Wrote: {}", cal_path.display());

    Ok(())
}

/// Score a feature-only CSV and write risk scores plus contact decisions.
fn run_predict(model_path: &str, input_csv: &str, output_csv: &str) -> Result<()> {
    println!("=== Prediction ===\n");

    let pipeline = ChurnPipeline::load(Path::new(model_path))?;
    let df = load_csv(input_csv)?;

    let decision = pipeline.decision;
    let policy = DecisionPolicy::new(pipeline, &decision)?;
    let risk = policy.risk_score(&df)?;
    let contact = policy.decide(&df)?;

    let mut out = df;
    out.with_column(Series::new("churn_risk", risk))?;
    out.with_column(Series::new("contact", contact))?;

    let out_path = Path::new(output_csv);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_csv(&mut out, out_path)?;

    println!("✓ Wrote: {}", out_path.display());
    println!(
        "  {} of {} customers flagged for contact (threshold {:.2})",
        out.column("contact")?.bool()?.sum().unwrap_or(0),
        out.height(),
        policy.threshold()
    );
    Ok(())
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}
