//! Small numeric helpers shared by the report builders.

use std::cmp::Ordering;

/// Rounds to `digits` decimals, ties to even on the exact binary value.
pub(crate) fn round_to(value: f64, digits: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", digits, value).parse().unwrap_or(value)
}

/// Median of the present values; `0.0` when there are none.
pub(crate) fn median<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut values: Vec<f64> = values.into_iter().flatten().collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Relative difference to `average` in percent, one decimal. Zero when the
/// average is not positive.
pub(crate) fn diff_pct(value: f64, average: f64) -> f64 {
    if average > 0.0 {
        round_to((value - average) / average * 100.0, 1)
    } else {
        0.0
    }
}

/// Index of the first maximum.
pub(crate) fn first_max(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Index of the first minimum.
pub(crate) fn first_min(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v >= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_on_the_exact_binary_value() {
        assert_eq!(round_to(45.4545, 1), 45.5);
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(1234.6, 0), 1235.0);
        assert_eq!(round_to(-21.01, 1), -21.0);
    }

    #[test]
    fn median_skips_missing_values() {
        assert_eq!(median([Some(3.0), None, Some(1.0), Some(2.0)]), 2.0);
        assert_eq!(median([Some(4.0), Some(1.0), Some(3.0), Some(2.0)]), 2.5);
        assert_eq!(median(Vec::<Option<f64>>::new()), 0.0);
        assert_eq!(median([None, None]), 0.0);
    }

    #[test]
    fn extremes_pick_the_first_occurrence() {
        let values = [1.0, 5.0, -2.0, 5.0, -2.0];
        assert_eq!(first_max(&values), Some(1));
        assert_eq!(first_min(&values), Some(2));
        assert_eq!(first_max(&[]), None);
    }

    #[test]
    fn diff_is_zero_without_a_positive_average() {
        assert_eq!(diff_pct(5.0, 0.0), 0.0);
        assert_eq!(diff_pct(8.0, 6.33), 26.4);
    }
}
