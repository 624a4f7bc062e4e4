//! YAML run configuration

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::metrics::CostModel;

/// Full run configuration, loaded from YAML. Every field has a default so
/// a partial config file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub cost: CostModel,
    #[serde(default)]
    pub outputs: OutputsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig::default(),
            split: SplitConfig::default(),
            model: ModelConfig::default(),
            cost: CostModel::default(),
            outputs: OutputsConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> crate::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    #[serde(default = "default_target_col")]
    pub target_col: String,
    #[serde(default = "default_drop_cols")]
    pub drop_cols: Vec<String>,
}

fn default_csv_path() -> String {
    "data/telco.csv".to_string()
}

fn default_target_col() -> String {
    "Churn".to_string()
}

fn default_drop_cols() -> Vec<String> {
    vec!["customerID".to_string()]
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            csv_path: default_csv_path(),
            target_col: default_target_col(),
            drop_cols: default_drop_cols(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_test_size() -> f64 {
    0.2
}

fn default_random_state() -> u64 {
    42
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            test_size: default_test_size(),
            random_state: default_random_state(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_max_iter")]
    pub max_iter: u64,
}

fn default_model_name() -> String {
    "logreg".to_string()
}

fn default_max_iter() -> u64 {
    2000
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            name: default_model_name(),
            max_iter: default_max_iter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsConfig {
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,
    #[serde(default = "default_curves_dir")]
    pub curves_dir: String,
}

fn default_artifacts_dir() -> String {
    "artifacts".to_string()
}

fn default_curves_dir() -> String {
    "reports/curves".to_string()
}

impl Default for OutputsConfig {
    fn default() -> Self {
        OutputsConfig {
            artifacts_dir: default_artifacts_dir(),
            curves_dir: default_curves_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.target_col, "Churn");
        assert_eq!(config.data.drop_cols, vec!["customerID".to_string()]);
        assert_eq!(config.split.test_size, 0.2);
        assert_eq!(config.split.random_state, 42);
        assert_eq!(config.model.name, "logreg");
        assert_eq!(config.cost.contact_cost, 1.0);
        assert_eq!(config.cost.save_benefit, 10.0);
        assert_eq!(config.outputs.artifacts_dir, "artifacts");
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
data:
  csv_path: data/customers.csv
  target_col: Churn
  drop_cols: [customerID]
split:
  test_size: 0.25
  random_state: 7
model:
  name: logistic_regression
cost:
  contact_cost: 2.0
  save_benefit: 25.0
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.data.csv_path, "data/customers.csv");
        assert_eq!(config.split.test_size, 0.25);
        assert_eq!(config.split.random_state, 7);
        assert_eq!(config.cost.contact_cost, 2.0);
        assert_eq!(config.cost.save_benefit, 25.0);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.model.max_iter, 2000);
        assert_eq!(config.outputs.curves_dir, "reports/curves");
    }

    #[test]
    fn test_missing_file_error_names_path() {
        let err = Config::load(Path::new("/no/such/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("/no/such/config.yaml"));
    }
}
