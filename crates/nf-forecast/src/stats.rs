//! Small sample-statistics helpers, hand-rolled rather than pulled from a
//! stats crate — matching the original's use of Python's stdlib
//! `statistics` module over a third-party dependency.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); `0.0` for fewer than 2
/// samples, matching `statistics.stdev`'s behavior of requiring n >= 2.
pub fn stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Median of `values`. Does not require `values` to be pre-sorted.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// `(p25, p75)` by direct index into the sorted sample when `n >= 4`;
/// otherwise both fall back to `median` (spec.md §4.10 step 6).
pub fn percentile_bounds(sorted_ascending: &[f64], median_fallback: f64) -> (f64, f64) {
    let n = sorted_ascending.len();
    if n >= 4 {
        (sorted_ascending[n / 4], sorted_ascending[3 * n / 4])
    } else {
        (median_fallback, median_fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn stdev_requires_two_samples() {
        assert_eq!(stdev(&[5.0]), 0.0);
        assert!(stdev(&[1.0, 2.0, 3.0]) > 0.0);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn percentile_bounds_falls_back_below_four_samples() {
        let (p25, p75) = percentile_bounds(&[1.0, 2.0, 3.0], 2.0);
        assert_eq!((p25, p75), (2.0, 2.0));
    }

    #[test]
    fn percentile_bounds_indexes_when_four_or_more() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let (p25, p75) = percentile_bounds(&sorted, 0.0);
        assert_eq!(p25, sorted[8 / 4]);
        assert_eq!(p75, sorted[3 * 8 / 4]);
    }
}
