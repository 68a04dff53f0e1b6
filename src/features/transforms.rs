// features/transforms.rs
//
// Column-wise transforms. Statistics come from the batch passed in and are
// returned so callers can report or reuse them.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Fills gaps with the mean of the present values.
/// An all-missing column has mean 0.0.
pub fn mean_impute(values: &[Option<f64>]) -> (Vec<f64>, f64) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let mean = if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f64>() / present.len() as f64
    };
    let filled = values.iter().map(|v| v.unwrap_or(mean)).collect();
    (filled, mean)
}

/// Zero mean, unit population variance. A constant column is only
/// centred (its scale is taken as 1).
pub fn standardize(values: &[f64]) -> (Vec<f64>, f64, f64) {
    if values.is_empty() {
        return (Vec::new(), 0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    let scale = if std > f64::EPSILON { std } else { 1.0 };
    let out = values.iter().map(|v| (v - mean) / scale).collect();
    (out, mean, scale)
}

/// Order used for category tables: numeric labels by value, ahead of
/// text labels, which compare as strings.
pub fn category_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Most common present value; ties go to the smallest.
pub fn most_frequent(values: &[Option<String>]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(va, na), (vb, nb)| na.cmp(nb).then_with(|| category_order(vb, va)))
        .map(|(v, _)| v.to_string())
}

/// Codes each value by its rank among the sorted distinct values.
pub fn ordinal_encode(values: &[String]) -> (Vec<f64>, Vec<String>) {
    let mut categories: Vec<String> = values.to_vec();
    categories.sort_by(|a, b| category_order(a, b));
    categories.dedup();

    let codes: HashMap<&str, f64> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i as f64))
        .collect();
    let encoded = values
        .iter()
        .map(|v| codes.get(v.as_str()).copied().unwrap_or(f64::NAN))
        .collect();
    (encoded, categories)
}

/// Natural log; missing stays NaN.
pub fn log_transform(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().map(|v| v.map_or(f64::NAN, f64::ln)).collect()
}

/// Share of rows taken by the single most common value, counting missing
/// as a value of its own.
pub fn dominant_share(values: &[Option<String>]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<Option<&str>, usize> = HashMap::new();
    for v in values {
        *counts.entry(v.as_deref()).or_insert(0) += 1;
    }
    let top = counts.values().copied().max().unwrap_or(0);
    top as f64 / values.len() as f64
}
