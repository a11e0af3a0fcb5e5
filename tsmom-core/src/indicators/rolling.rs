//! Trailing window sum and sample standard deviation.
//!
//! Both require `period` observations; a non-finite value anywhere in the
//! window makes the output `NaN` until it has rolled out.

/// Trailing sum of the last `period` values.
///
/// First valid value at index `period - 1`. A zero period yields all `NaN`.
/// A window holding one repeated value sums to exactly `value * period`, so
/// a stretch of zero returns reads as zero momentum.
pub fn rolling_sum(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    // Running sum of the finite entries plus a count of the others, so a NaN
    // leaving the window does not poison every later sum.
    let mut sum = NeumaierSum::default();
    let mut bad = 0usize;
    let mut run = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            sum.add(v);
        } else {
            bad += 1;
        }
        run = if i > 0 && values[i - 1] == v { run + 1 } else { 1 };
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_finite() {
                sum.add(-leaving);
            } else {
                bad -= 1;
            }
        }
        if i + 1 < period || bad > 0 {
            continue;
        }
        if run >= period {
            // rounding residue from values that already left
            sum = NeumaierSum::from(v * period as f64);
        }
        result[i] = sum.value();
    }

    result
}

/// Compensated summation; carries the low-order bits lost by each addition.
#[derive(Debug, Default, Clone, Copy)]
struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl From<f64> for NeumaierSum {
    fn from(sum: f64) -> Self {
        Self {
            sum,
            compensation: 0.0,
        }
    }
}

/// Trailing sample standard deviation (divisor `period - 1`).
///
/// Each window is computed in two passes (mean, then squared deviations) so
/// that a window of identical values yields exactly zero. Periods below 2 are
/// undefined and yield all `NaN`.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period < 2 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        result[i] = var.sqrt();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sum_basic() {
        let result = rolling_sum(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(result[0].is_nan());
        assert_approx(result[1], 3.0, DEFAULT_EPSILON);
        assert_approx(result[2], 5.0, DEFAULT_EPSILON);
        assert_approx(result[3], 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sum_short_input_is_all_nan() {
        assert!(rolling_sum(&[1.0, 2.0], 3).iter().all(|v| v.is_nan()));
        assert!(rolling_sum(&[], 3).is_empty());
        assert!(rolling_sum(&[1.0], 0)[0].is_nan());
    }

    #[test]
    fn sum_nan_recovers_after_leaving_window() {
        let result = rolling_sum(&[1.0, f64::NAN, 2.0, 3.0, 4.0], 2);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 5.0, DEFAULT_EPSILON);
        assert_approx(result[4], 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sum_of_zeros_after_moves_is_exactly_zero() {
        let mut values = vec![0.1, 0.2, 0.3];
        values.extend([0.0; 5]);
        let result = rolling_sum(&values, 3);
        assert_eq!(result[5], 0.0);
        assert_eq!(result[7], 0.0);
    }

    #[test]
    fn sum_of_repeated_value_is_exact() {
        let mut values = vec![0.7, -0.3];
        values.extend([0.1; 6]);
        let result = rolling_sum(&values, 4);
        assert_eq!(result[7], 0.1 * 4.0);
    }

    #[test]
    fn compensated_sum_cancels_cleanly() {
        // naive summation loses the 1.0 entirely
        let result = rolling_sum(&[1e16, 1.0, -1e16], 3);
        assert_eq!(result[2], 1.0);
    }

    #[test]
    fn std_matches_sample_definition() {
        // sample std of [2, 4, 4, 4, 5, 5, 7, 9] = sqrt(32 / 7)
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = rolling_std(&values, 8);
        assert_approx(result[7], (32.0_f64 / 7.0).sqrt(), DEFAULT_EPSILON);
        assert!(result[6].is_nan());
    }

    #[test]
    fn std_of_constant_window_is_exactly_zero() {
        let result = rolling_std(&[0.0; 10], 5);
        assert_eq!(result[9], 0.0);
    }

    #[test]
    fn std_period_one_undefined() {
        assert!(rolling_std(&[1.0, 2.0], 1).iter().all(|v| v.is_nan()));
    }
}
