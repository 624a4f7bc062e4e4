//! Fitted feature preprocessing: imputation and one-hot encoding
//!
//! Mirrors the train-time/apply-time split of a fitted transformer: `fit`
//! memorizes per-column statistics from the training frame, `transform`
//! applies them to any later frame and produces the numeric matrix the
//! model consumes.

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NumericColumn {
    name: String,
    median: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoricalColumn {
    name: String,
    mode: String,
    /// Sorted unique train-time values; one indicator column per entry.
    categories: Vec<String>,
}

/// Fitted preprocessing state.
///
/// Numeric columns: nulls impute to the train median. Categorical (string)
/// columns: nulls impute to the train mode, then one-hot over the train
/// categories; values unseen at fit time encode as all zeros. Columns the
/// fit never saw are ignored at transform time, columns it did see must be
/// present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    /// Learn imputation values and category vocabularies from the training
    /// frame. String columns become categorical, numeric dtypes numeric;
    /// any other dtype is an error, as is an all-null column.
    pub fn fit(x_train: &DataFrame) -> crate::Result<Preprocessor> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for series in x_train.get_columns() {
            let name = series.name().to_string();
            match series.dtype() {
                DataType::Utf8 => {
                    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                    for value in series.utf8()?.into_iter().flatten() {
                        *counts.entry(value.to_string()).or_insert(0) += 1;
                    }
                    if counts.is_empty() {
                        anyhow::bail!("categorical column '{}' has no non-null values", name);
                    }
                    // Strict > keeps the smallest value on tied counts,
                    // since BTreeMap iterates in ascending order.
                    let mut mode = String::new();
                    let mut best = 0usize;
                    for (value, &count) in &counts {
                        if count > best {
                            best = count;
                            mode = value.clone();
                        }
                    }
                    categorical.push(CategoricalColumn {
                        name,
                        mode,
                        categories: counts.into_keys().collect(),
                    });
                }
                dtype if dtype.is_numeric() => {
                    let mut values: Vec<f64> = series
                        .cast(&DataType::Float64)?
                        .f64()?
                        .into_iter()
                        .flatten()
                        .collect();
                    if values.is_empty() {
                        anyhow::bail!("numeric column '{}' has no non-null values", name);
                    }
                    values.sort_by(|a, b| a.total_cmp(b));
                    let mid = values.len() / 2;
                    let median = if values.len() % 2 == 0 {
                        (values[mid - 1] + values[mid]) / 2.0
                    } else {
                        values[mid]
                    };
                    numeric.push(NumericColumn { name, median });
                }
                other => anyhow::bail!(
                    "column '{}' has unsupported dtype {} for preprocessing",
                    name,
                    other
                ),
            }
        }

        Ok(Preprocessor {
            numeric,
            categorical,
        })
    }

    /// Number of output feature columns.
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|col| col.categories.len())
                .sum::<usize>()
    }

    /// Output column names in matrix order: numeric columns first, then one
    /// `col_value` indicator per train-time category.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|col| col.name.clone()).collect();
        for col in &self.categorical {
            for category in &col.categories {
                names.push(format!("{}_{}", col.name, category));
            }
        }
        names
    }

    /// Apply the fitted transform, producing an (n_rows, width) matrix.
    pub fn transform(&self, df: &DataFrame) -> crate::Result<Array2<f64>> {
        let n_rows = df.height();
        let mut matrix = Array2::<f64>::zeros((n_rows, self.width()));

        let mut offset = 0usize;
        for col in &self.numeric {
            let series = df.column(&col.name).map_err(|_| {
                anyhow::anyhow!("fitted numeric column '{}' missing from input", col.name)
            })?;
            let values = series.cast(&DataType::Float64)?;
            for (row, value) in values.f64()?.into_iter().enumerate() {
                matrix[[row, offset]] = value.unwrap_or(col.median);
            }
            offset += 1;
        }

        for col in &self.categorical {
            let series = df.column(&col.name).map_err(|_| {
                anyhow::anyhow!("fitted categorical column '{}' missing from input", col.name)
            })?;
            let values = series.cast(&DataType::Utf8)?;
            for (row, value) in values.utf8()?.into_iter().enumerate() {
                let value = value.unwrap_or(&col.mode);
                // Unseen categories stay all-zero.
                if let Ok(pos) = col.categories.binary_search_by(|c| c.as_str().cmp(value)) {
                    matrix[[row, offset + pos]] = 1.0;
                }
            }
            offset += col.categories.len();
        }

        Ok(matrix)
    }
}
