//! Contact decision policy over a fitted probability model
//!
//! Wraps any probability-producing model together with a chosen operating
//! point. At prediction time labels no longer exist, so the policy only
//! needs the model's risk scores and the stored threshold.

use polars::prelude::DataFrame;

use crate::metrics::{EvalError, ThresholdDecision};

/// Capability of a fitted model: per-row probability of the positive class.
pub trait ProbabilityModel {
    /// P(churn=1) for each row of `features`. Schema mismatches against the
    /// fitted columns are this collaborator's error domain, not the policy's.
    fn predict_probability(&self, features: &DataFrame) -> crate::Result<Vec<f64>>;
}

/// Applies a fixed probability threshold to a model's risk scores.
///
/// Stateless: a pure function of (model, threshold, input).
#[derive(Debug)]
pub struct DecisionPolicy<M: ProbabilityModel> {
    model: M,
    threshold: f64,
}

impl<M: ProbabilityModel> DecisionPolicy<M> {
    /// Build a policy from an optimizer-chosen operating point.
    pub fn new(model: M, decision: &ThresholdDecision) -> Result<Self, EvalError> {
        Self::with_threshold(model, decision.threshold)
    }

    /// Build a policy from an externally supplied threshold.
    pub fn with_threshold(model: M, threshold: f64) -> Result<Self, EvalError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(EvalError::invalid_config(format!(
                "decision threshold must be in [0, 1], got {}",
                threshold
            )));
        }
        Ok(DecisionPolicy { model, threshold })
    }

    /// The stored operating point.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True for each row whose predicted churn probability reaches the
    /// threshold, i.e. "contact this customer".
    pub fn decide(&self, features: &DataFrame) -> crate::Result<Vec<bool>> {
        let probabilities = self.model.predict_probability(features)?;
        Ok(probabilities
            .into_iter()
            .map(|prob| prob >= self.threshold)
            .collect())
    }

    /// Passthrough of the model's probabilities, for reporting alongside
    /// the raw predictions.
    pub fn risk_score(&self, features: &DataFrame) -> crate::Result<Vec<f64>> {
        self.model.predict_probability(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    /// Returns canned probabilities regardless of input.
    struct FixedModel(Vec<f64>);

    impl ProbabilityModel for FixedModel {
        fn predict_probability(&self, _features: &DataFrame) -> crate::Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    fn empty_frame() -> DataFrame {
        DataFrame::new(vec![Series::new("x", &[1.0f64, 2.0, 3.0, 4.0])]).unwrap()
    }

    #[test]
    fn test_decide_boundary_is_inclusive() {
        let model = FixedModel(vec![0.49, 0.5, 0.51, 0.1]);
        let policy = DecisionPolicy::with_threshold(model, 0.5).unwrap();

        let decisions = policy.decide(&empty_frame()).unwrap();
        assert_eq!(decisions, vec![false, true, true, false]);
    }

    #[test]
    fn test_policy_from_threshold_decision() {
        let decision = ThresholdDecision {
            threshold: 0.3,
            utility: 12.0,
        };
        let model = FixedModel(vec![0.2, 0.35]);
        let policy = DecisionPolicy::new(model, &decision).unwrap();

        assert_eq!(policy.threshold(), 0.3);
        assert_eq!(policy.decide(&empty_frame()).unwrap(), vec![false, true]);
    }

    #[test]
    fn test_risk_score_is_passthrough() {
        let probabilities = vec![0.1, 0.9, 0.5, 0.42];
        let model = FixedModel(probabilities.clone());
        let policy = DecisionPolicy::with_threshold(model, 0.5).unwrap();

        assert_eq!(policy.risk_score(&empty_frame()).unwrap(), probabilities);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        assert!(DecisionPolicy::with_threshold(FixedModel(vec![]), 1.5).is_err());
        assert!(DecisionPolicy::with_threshold(FixedModel(vec![]), -0.1).is_err());
        assert!(DecisionPolicy::with_threshold(FixedModel(vec![]), f64::NAN).is_err());
    }
}
