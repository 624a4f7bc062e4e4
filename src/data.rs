//! CSV loading, cleaning, and stratified splitting using Polars

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Frozen train/test partition of features and labels.
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
}

/// Load a customer CSV with a header row.
pub fn load_csv(path: &str) -> crate::Result<DataFrame> {
    let df = CsvReader::from_path(path)?.has_header(true).finish()?;
    if df.height() == 0 {
        anyhow::bail!("no rows found in {}", path);
    }
    Ok(df)
}

/// Clean the raw frame into (features, labels).
///
/// Drops ID-like columns when present, maps the target column to {0, 1}
/// through an explicit allowlist (`yes`/`no`, `true`/`false`, `1`/`0`,
/// case-insensitive, trimmed), and coerces a string-typed `TotalCharges`
/// column to numeric with blanks becoming nulls. Any target value outside
/// the allowlist is an error naming the value; labels are never guessed.
pub fn clean(
    df: &DataFrame,
    target_col: &str,
    drop_cols: &[String],
) -> crate::Result<(DataFrame, Vec<u8>)> {
    let mut df = df.clone();
    for col in drop_cols {
        if df.get_column_names().contains(&col.as_str()) {
            df = df.drop(col)?;
        }
    }

    if !df.get_column_names().contains(&target_col) {
        anyhow::bail!(
            "target column '{}' not found in columns: {:?}",
            target_col,
            df.get_column_names()
        );
    }

    let y = map_target(df.column(target_col)?)?;
    let mut x = df.drop(target_col)?;

    // The telco dataset ships TotalCharges as strings with blank entries.
    if let Ok(series) = x.column("TotalCharges") {
        if series.dtype() == &DataType::Utf8 {
            let coerced: Vec<Option<f64>> = series
                .utf8()?
                .into_iter()
                .map(|value| value.and_then(|v| v.trim().parse::<f64>().ok()))
                .collect();
            x.with_column(Series::new("TotalCharges", coerced))?;
        }
    }

    Ok((x, y))
}

fn map_target(series: &Series) -> crate::Result<Vec<u8>> {
    let as_text = series.cast(&DataType::Utf8)?;
    let chunked = as_text.utf8()?;

    let mut labels = Vec::with_capacity(chunked.len());
    for (row, value) in chunked.into_iter().enumerate() {
        let value = value
            .ok_or_else(|| anyhow::anyhow!("null target value at row {}", row))?;
        let label = match value.trim().to_lowercase().as_str() {
            "yes" | "true" | "1" => 1u8,
            "no" | "false" | "0" => 0u8,
            other => anyhow::bail!(
                "unmappable target value '{}' at row {}; expected yes/no, true/false, or 1/0",
                other,
                row
            ),
        };
        labels.push(label);
    }
    Ok(labels)
}

/// Stratified train/test split, reproducible from `random_state`.
///
/// Each class's indices are shuffled with a seeded RNG; the per-class test
/// count is `round(n_class * test_size)` clamped to [1, n_class - 1], so
/// both classes always appear in both partitions. Classes with fewer than
/// two members cannot be split and are an error.
pub fn split_stratified(
    x: &DataFrame,
    y: &[u8],
    test_size: f64,
    random_state: u64,
) -> crate::Result<SplitData> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        anyhow::bail!("test_size must be in (0, 1), got {}", test_size);
    }
    if y.len() != x.height() {
        anyhow::bail!(
            "label length {} != feature row count {}",
            y.len(),
            x.height()
        );
    }

    let mut rng = StdRng::seed_from_u64(random_state);
    let mut train_idx: Vec<u32> = Vec::new();
    let mut test_idx: Vec<u32> = Vec::new();

    for class in [0u8, 1u8] {
        let mut pool: Vec<u32> = y
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i as u32)
            .collect();
        if pool.len() < 2 {
            anyhow::bail!(
                "class {} has {} example(s); at least 2 are required for a stratified split",
                class,
                pool.len()
            );
        }

        let n_test = ((pool.len() as f64 * test_size).round() as usize)
            .clamp(1, pool.len() - 1);
        pool.shuffle(&mut rng);
        test_idx.extend_from_slice(&pool[..n_test]);
        train_idx.extend_from_slice(&pool[n_test..]);
    }

    train_idx.sort_unstable();
    test_idx.sort_unstable();

    let x_train = x.take(&IdxCa::from_vec("idx", train_idx.clone()))?;
    let x_test = x.take(&IdxCa::from_vec("idx", test_idx.clone()))?;
    let y_train = train_idx.iter().map(|&i| y[i as usize]).collect();
    let y_test = test_idx.iter().map(|&i| y[i as usize]).collect();

    Ok(SplitData {
        x_train,
        x_test,
        y_train,
        y_test,
    })
}
