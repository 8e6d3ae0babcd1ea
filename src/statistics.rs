/// Small statistics helpers used when validating utility data.
use statrs::statistics::Statistics;

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(numbers: &[f64]) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }

    Some(numbers.iter().mean())
}

/// Values lying outside `[low_ratio, high_ratio]` times the mean of `numbers`, with their index.
pub fn outliers_against_mean(numbers: &[f64], low_ratio: f64, high_ratio: f64) -> Vec<(usize, f64)> {
    let Some(mean) = mean(numbers) else {
        return vec![];
    };

    numbers
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, value)| *value > mean * high_ratio || *value < mean * low_ratio)
        .collect()
}
