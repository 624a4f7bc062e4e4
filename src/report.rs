//! Training run report assembly and persistence

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::Config;
use crate::metrics::{MetricReport, ThresholdDecision};

/// The structured record a training run leaves behind: flat metric keys,
/// the recommended operating point, the configuration that produced them,
/// and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub brier: f64,
    pub recommended_threshold: ThresholdDecision,
    pub config: Config,
    pub generated_at: String,
}

impl TrainingReport {
    pub fn new(metrics: &MetricReport, decision: &ThresholdDecision, config: &Config) -> Self {
        TrainingReport {
            roc_auc: metrics.roc_auc,
            pr_auc: metrics.pr_auc,
            brier: metrics.brier,
            recommended_threshold: *decision,
            config: config.clone(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }
}
