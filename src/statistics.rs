/// A simple statistics module with the summary measures used by calibration and result reduction.
use itertools::Itertools;
use statrs::statistics::Statistics;

/// Arithmetic mean, or zero for an empty slice.
pub fn mean_or_zero(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        0.
    } else {
        numbers.mean()
    }
}

/// Population standard deviation of the differences between successive samples, a measure of how
/// smoothly a series moves from one step to the next.
pub fn successive_difference_std_dev(numbers: &[f64]) -> f64 {
    let differences = numbers
        .iter()
        .tuple_windows()
        .map(|(previous, next)| next - previous)
        .collect_vec();

    if differences.is_empty() {
        0.
    } else {
        differences.population_std_dev()
    }
}

/// Largest absolute value, or zero for an empty slice.
pub fn max_abs(numbers: &[f64]) -> f64 {
    numbers.iter().fold(0., |acc: f64, value| acc.max(value.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[fixture]
    fn numbers() -> [f64; 6] {
        [20.0, 21.0, 20.5, 22.0, 21.0, 21.5]
    }

    #[rstest]
    fn test_mean(numbers: [f64; 6]) {
        assert_relative_eq!(mean_or_zero(&numbers), 21.0);
        assert_eq!(mean_or_zero(&[]), 0.);
    }

    #[rstest]
    fn test_successive_difference_std_dev(numbers: [f64; 6]) {
        // differences are [1.0, -0.5, 1.5, -1.0, 0.5], mean 0.3
        assert_relative_eq!(
            successive_difference_std_dev(&numbers),
            0.927_361_849_549_570_3,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn test_successive_difference_std_dev_of_flat_or_short_series() {
        assert_eq!(successive_difference_std_dev(&[21.0, 21.0, 21.0]), 0.);
        assert_eq!(successive_difference_std_dev(&[21.0]), 0.);
    }

    #[rstest]
    fn test_max_abs() {
        assert_eq!(max_abs(&[-3.5, 2.0, 1.0]), 3.5);
        assert_eq!(max_abs(&[]), 0.);
    }
}
