//! ChurnGuard: cost-aware churn prediction and contact decisioning
//!
//! Trains a probabilistic churn classifier on customer data, summarizes its
//! ranking and calibration quality, and picks the contact threshold that
//! maximizes expected monetary utility under a linear cost/benefit model.

pub mod cli;
pub mod config;
pub mod data;
pub mod features;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod report;

// Re-export public items for easier access
pub use cli::{Cli, Command};
pub use config::Config;
pub use data::{clean, load_csv, split_stratified, SplitData};
pub use features::Preprocessor;
pub use metrics::{
    calibration_curve, pick_threshold, roc_curve, CostModel, EvalError, MetricReport,
    ThresholdDecision,
};
pub use model::{build_model, ChurnModel, ChurnPipeline};
pub use policy::{DecisionPolicy, ProbabilityModel};
pub use report::TrainingReport;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
