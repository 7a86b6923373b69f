//! Robust summaries of empirical-over-expected power ratios

use thiserror::Error;

/// Errors from statistical summaries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("no finite values to summarize ({total} values, all NaN)")]
    NoValidValues { total: usize },
}

/// Median of the non-NaN values in `values`
///
/// Infinite values take part in the ordering. For even counts the two middle
/// values are averaged.
pub fn median(values: &[f64]) -> Result<f64, StatsError> {
    let mut valid: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();

    if valid.is_empty() {
        return Err(StatsError::NoValidValues {
            total: values.len(),
        });
    }

    valid.sort_by(|a, b| a.total_cmp(b));

    let mid = valid.len() / 2;
    if valid.len() % 2 == 0 {
        Ok((valid[mid - 1] + valid[mid]) / 2.0)
    } else {
        Ok(valid[mid])
    }
}
