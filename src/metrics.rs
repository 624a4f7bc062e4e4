//! Probabilistic classification metrics and cost-sensitive threshold search
//!
//! This module is the evaluation and decision core: it summarizes how well a
//! probabilistic churn model ranks and calibrates (`MetricReport`), and it
//! converts a vector of churn probabilities into an operating point by
//! grid-searching the contact threshold that maximizes expected monetary
//! utility (`pick_threshold`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the evaluation and threshold-search layer.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Malformed label or probability vectors: empty input, length mismatch,
    /// non-binary labels, probabilities outside [0, 1], or single-class
    /// labels where a ranking metric is requested.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Nonsensical evaluation parameters: non-positive costs or benefits,
    /// thresholds outside [0, 1], zero calibration bins.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EvalError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EvalError::InvalidInput(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        EvalError::InvalidConfig(msg.into())
    }
}

/// Ranking and calibration summary for a probabilistic binary classifier.
///
/// Built once per (labels, probabilities) pair and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    /// Probability that a random positive ranks above a random negative.
    pub roc_auc: f64,
    /// Average precision: area under the precision-recall curve.
    pub pr_auc: f64,
    /// Mean squared error between predicted probability and binary outcome.
    pub brier: f64,
}

impl MetricReport {
    /// Compute metrics from binary labels and predicted probabilities.
    ///
    /// `p[i]` is P(y=1) for example `i`. Degenerate inputs are rejected
    /// rather than producing NaN: both classes must be present, every label
    /// must be 0 or 1, and every probability must be finite in [0, 1].
    pub fn from_scores(y: &[u8], p: &[f64]) -> Result<MetricReport, EvalError> {
        validate_vectors(y, p)?;
        require_both_classes(y)?;

        let sweep = ranked_sweep(y, p);
        let pos = y.iter().filter(|&&v| v == 1).count() as f64;
        let neg = y.len() as f64 - pos;

        // ROC-AUC: trapezoid over (fpr, tpr) with tied scores grouped into a
        // single step, which credits ties with half a win.
        let mut roc_auc = 0.0;
        let mut prev_fpr = 0.0;
        let mut prev_tpr = 0.0;
        for point in &sweep {
            let fpr = point.fp as f64 / neg;
            let tpr = point.tp as f64 / pos;
            roc_auc += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0;
            prev_fpr = fpr;
            prev_tpr = tpr;
        }

        // Average precision: step sum over recall increments, not a
        // trapezoid. Matches the standard average-precision definition.
        let mut pr_auc = 0.0;
        let mut prev_recall = 0.0;
        for point in &sweep {
            let recall = point.tp as f64 / pos;
            let precision = point.tp as f64 / (point.tp + point.fp) as f64;
            pr_auc += (recall - prev_recall) * precision;
            prev_recall = recall;
        }

        let brier = y
            .iter()
            .zip(p.iter())
            .map(|(&label, &prob)| (prob - label as f64).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        Ok(MetricReport {
            roc_auc,
            pr_auc,
            brier,
        })
    }
}

/// A single point on the ROC curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RocPoint {
    /// Score cutoff at which this point is reached.
    pub threshold: f64,
    /// False positive rate: FP / N.
    pub fpr: f64,
    /// True positive rate: TP / P.
    pub tpr: f64,
}

/// Compute ROC curve data for an external renderer.
///
/// Walks distinct scores in descending order (ties grouped) and anchors the
/// curve at (fpr=0, tpr=0) with an infinite threshold. Same input validation
/// as [`MetricReport::from_scores`].
pub fn roc_curve(y: &[u8], p: &[f64]) -> Result<Vec<RocPoint>, EvalError> {
    validate_vectors(y, p)?;
    require_both_classes(y)?;

    let pos = y.iter().filter(|&&v| v == 1).count() as f64;
    let neg = y.len() as f64 - pos;

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];
    for point in ranked_sweep(y, p) {
        points.push(RocPoint {
            threshold: point.threshold,
            fpr: point.fp as f64 / neg,
            tpr: point.tp as f64 / pos,
        });
    }
    Ok(points)
}

/// One occupied bin of a reliability diagram.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationBin {
    /// Mean predicted probability of the examples in this bin.
    pub mean_predicted: f64,
    /// Observed positive fraction in this bin.
    pub fraction_positive: f64,
    /// Number of examples in this bin.
    pub count: usize,
}

/// Bin probabilities into `n_bins` uniform bins over [0, 1] and report the
/// observed positive rate per bin. Probabilities of exactly 1.0 fall into
/// the last bin; empty bins are omitted.
pub fn calibration_curve(
    y: &[u8],
    p: &[f64],
    n_bins: usize,
) -> Result<Vec<CalibrationBin>, EvalError> {
    if n_bins == 0 {
        return Err(EvalError::invalid_config(
            "calibration curve requires at least one bin",
        ));
    }
    validate_vectors(y, p)?;

    let mut sums = vec![0.0f64; n_bins];
    let mut positives = vec![0usize; n_bins];
    let mut counts = vec![0usize; n_bins];
    for (&label, &prob) in y.iter().zip(p.iter()) {
        let bin = ((prob * n_bins as f64) as usize).min(n_bins - 1);
        sums[bin] += prob;
        positives[bin] += label as usize;
        counts[bin] += 1;
    }

    Ok((0..n_bins)
        .filter(|&b| counts[b] > 0)
        .map(|b| CalibrationBin {
            mean_predicted: sums[b] / counts[b] as f64,
            fraction_positive: positives[b] as f64 / counts[b] as f64,
            count: counts[b],
        })
        .collect())
}

/// Linear cost/benefit model for the contact decision.
///
/// Contacting one customer costs `contact_cost`; retaining a would-be
/// churner through contact yields `save_benefit`. An explicit parameter
/// struct so multiple cost scenarios can be evaluated side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    #[serde(default = "default_contact_cost")]
    pub contact_cost: f64,
    #[serde(default = "default_save_benefit")]
    pub save_benefit: f64,
}

fn default_contact_cost() -> f64 {
    1.0
}

fn default_save_benefit() -> f64 {
    10.0
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            contact_cost: default_contact_cost(),
            save_benefit: default_save_benefit(),
        }
    }
}

impl CostModel {
    fn validate(&self) -> Result<(), EvalError> {
        if !self.contact_cost.is_finite() || self.contact_cost <= 0.0 {
            return Err(EvalError::invalid_config(format!(
                "contact_cost must be a positive finite number, got {}",
                self.contact_cost
            )));
        }
        if !self.save_benefit.is_finite() || self.save_benefit <= 0.0 {
            return Err(EvalError::invalid_config(format!(
                "save_benefit must be a positive finite number, got {}",
                self.save_benefit
            )));
        }
        Ok(())
    }
}

/// The chosen operating point: a probability cutoff and the expected
/// utility it achieves on the evaluation data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdDecision {
    pub threshold: f64,
    pub utility: f64,
}

/// The fixed evaluation grid: 19 thresholds from 0.05 to 0.95 in steps of
/// 0.05. Coarse on purpose: the extremes trivially contact everyone or no
/// one, and downstream reports record the chosen value, so the grid must be
/// reproducible exactly.
pub fn threshold_grid() -> Vec<f64> {
    (1..=19).map(|k| k as f64 * 0.05).collect()
}

/// Choose the contact threshold maximizing expected utility.
///
/// For each grid candidate `t`, examples with `p >= t` are contacted;
/// `utility(t) = tp * save_benefit - n_contact * contact_cost`. All
/// utilities are computed before selection; the scan runs in ascending
/// threshold order and replaces the running best only on a strictly greater
/// utility, so the lowest threshold wins ties regardless of how the
/// utilities were produced.
///
/// Single-class labels are allowed here (an all-negative vector simply
/// drives the search to the emptiest contact set); costs must be positive
/// and finite.
pub fn pick_threshold(
    y: &[u8],
    p: &[f64],
    costs: &CostModel,
) -> Result<ThresholdDecision, EvalError> {
    costs.validate()?;
    validate_vectors(y, p)?;

    let utilities: Vec<(f64, f64)> = threshold_grid()
        .into_iter()
        .map(|t| (t, utility_at(y, p, t, costs)))
        .collect();

    let mut best_threshold = 0.5;
    let mut best_utility = f64::NEG_INFINITY;
    for (threshold, utility) in utilities {
        if utility > best_utility {
            best_utility = utility;
            best_threshold = threshold;
        }
    }

    Ok(ThresholdDecision {
        threshold: best_threshold,
        utility: best_utility,
    })
}

fn utility_at(y: &[u8], p: &[f64], threshold: f64, costs: &CostModel) -> f64 {
    let mut tp = 0usize;
    let mut n_contact = 0usize;
    for (&label, &prob) in y.iter().zip(p.iter()) {
        if prob >= threshold {
            n_contact += 1;
            if label == 1 {
                tp += 1;
            }
        }
    }
    tp as f64 * costs.save_benefit - n_contact as f64 * costs.contact_cost
}

/// Cumulative (tp, fp) at each distinct score, descending.
struct SweepPoint {
    threshold: f64,
    tp: usize,
    fp: usize,
}

/// Walk examples by descending score, merging tied scores into one step.
fn ranked_sweep(y: &[u8], p: &[f64]) -> Vec<SweepPoint> {
    let mut order: Vec<usize> = (0..y.len()).collect();
    order.sort_by(|&a, &b| p[b].total_cmp(&p[a]));

    let mut points = Vec::new();
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < order.len() {
        let score = p[order[i]];
        while i < order.len() && p[order[i]] == score {
            if y[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(SweepPoint {
            threshold: score,
            tp,
            fp,
        });
    }
    points
}

fn validate_vectors(y: &[u8], p: &[f64]) -> Result<(), EvalError> {
    if y.is_empty() {
        return Err(EvalError::invalid_input("empty label vector"));
    }
    if y.len() != p.len() {
        return Err(EvalError::invalid_input(format!(
            "label length {} != probability length {}",
            y.len(),
            p.len()
        )));
    }
    for (i, &label) in y.iter().enumerate() {
        if label > 1 {
            return Err(EvalError::invalid_input(format!(
                "label {} at index {} is not in {{0, 1}}",
                label, i
            )));
        }
    }
    for (i, &prob) in p.iter().enumerate() {
        if !prob.is_finite() || !(0.0..=1.0).contains(&prob) {
            return Err(EvalError::invalid_input(format!(
                "probability {} at index {} is not in [0, 1]",
                prob, i
            )));
        }
    }
    Ok(())
}

fn require_both_classes(y: &[u8]) -> Result<(), EvalError> {
    let pos = y.iter().filter(|&&v| v == 1).count();
    if pos == 0 || pos == y.len() {
        return Err(EvalError::invalid_input(
            "labels contain a single class; ROC-AUC and average precision are undefined",
        ));
    }
    Ok(())
}
