//! Churn model fitting, scoring, and pipeline persistence
//!
//! The classifier itself is a library call (`linfa-logistic`); this module
//! wraps fitting, keeps the extracted weights so a saved bundle can score
//! without refitting, and packages preprocessor + model + operating point
//! into a single JSON artifact.

use linfa::prelude::*;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::features::Preprocessor;
use crate::metrics::ThresholdDecision;
use crate::policy::ProbabilityModel;

/// Supported model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    LogisticRegression,
}

/// Resolve a configured model name, accepting the usual aliases.
pub fn build_model(name: &str) -> crate::Result<ModelKind> {
    match name.trim().to_lowercase().as_str() {
        "logreg" | "logistic" | "logistic_regression" => Ok(ModelKind::LogisticRegression),
        other => anyhow::bail!("unknown model name: {}", other),
    }
}

/// Fitted logistic churn model.
///
/// Holds the weights extracted from the fitted linfa model, so scoring is
/// `sigmoid(x . w + b)` and rehydration from JSON needs no solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ChurnModel {
    /// Fit a logistic regression on the feature matrix.
    ///
    /// `y` must contain both classes; the check runs before the solver so
    /// the failure names the actual problem instead of a solver error.
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        feature_names: Vec<String>,
        max_iter: u64,
    ) -> crate::Result<ChurnModel> {
        if y.len() != x.nrows() {
            anyhow::bail!(
                "label length {} != feature row count {}",
                y.len(),
                x.nrows()
            );
        }
        let positives = y.iter().filter(|&&v| v == 1).count();
        if positives == 0 || positives == y.len() {
            anyhow::bail!("training labels contain a single class; cannot fit a classifier");
        }
        if feature_names.len() != x.ncols() {
            anyhow::bail!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                x.ncols()
            );
        }

        let targets: Array1<usize> = Array1::from(
            y.iter().map(|&label| label as usize).collect::<Vec<_>>(),
        );
        let dataset = Dataset::new(x.to_owned(), targets);
        let fitted = LogisticRegression::default()
            .with_intercept(true)
            .max_iterations(max_iter)
            .fit(&dataset)?;

        Ok(ChurnModel {
            feature_names,
            coefficients: fitted.params().to_vec(),
            intercept: fitted.intercept(),
        })
    }

    /// P(churn=1) per row of the feature matrix.
    pub fn predict_probability(&self, x: &Array2<f64>) -> crate::Result<Vec<f64>> {
        if x.ncols() != self.coefficients.len() {
            anyhow::bail!(
                "feature matrix has {} columns, model was fitted on {}",
                x.ncols(),
                self.coefficients.len()
            );
        }

        Ok(x.outer_iter()
            .map(|row| {
                let z = row
                    .iter()
                    .zip(self.coefficients.iter())
                    .map(|(value, weight)| value * weight)
                    .sum::<f64>()
                    + self.intercept;
                sigmoid(z)
            })
            .collect())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// The complete training artifact: fitted preprocessing, fitted model, and
/// the chosen operating point. Saved as pretty JSON; the format is an
/// implementation detail, not a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnPipeline {
    pub preprocessor: Preprocessor,
    pub model: ChurnModel,
    pub decision: ThresholdDecision,
}

impl ChurnPipeline {
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        use anyhow::Context;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write model bundle to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> crate::Result<ChurnPipeline> {
        use anyhow::Context;
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model bundle from {}", path.display()))?;
        let pipeline = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse model bundle {}", path.display()))?;
        Ok(pipeline)
    }
}

impl ProbabilityModel for ChurnPipeline {
    fn predict_probability(&self, features: &DataFrame) -> crate::Result<Vec<f64>> {
        let x = self.preprocessor.transform(features)?;
        self.model.predict_probability(&x)
    }
}
