//! Per-column summary statistics for the generated dataset.

use crate::types::{SampleRow, NUMERIC_COLUMNS};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub count: usize,
    pub mean: f64,
    pub std: f64, // sample standard deviation
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarises every numeric column. Returns an empty vec for an empty dataset.
pub fn describe(rows: &[SampleRow]) -> Vec<ColumnSummary> {
    if rows.is_empty() {
        return Vec::new();
    }

    let values: Vec<[f64; 12]> = rows.iter().map(SampleRow::numeric_values).collect();

    NUMERIC_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, &name)| {
            let mut column: Vec<f64> = values.iter().map(|v| v[i]).collect();
            column.sort_by(f64::total_cmp);
            summarize(name, &column)
        })
        .collect()
}

fn summarize(name: &'static str, sorted: &[f64]) -> ColumnSummary {
    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    ColumnSummary {
        name,
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q75: quantile(sorted, 0.75),
        max: sorted[count - 1],
    }
}

/// Linear interpolation between closest ranks on pre-sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
