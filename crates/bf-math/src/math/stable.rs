//! Numerically stable primitives: compensated summation and log-domain helpers.

use std::f64::consts::PI;

const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8; // 0.5 * ln(2*pi)
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)] // These are published numerical constants
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Neumaier-compensated sum.
///
/// Keeps the running error of a long float sum bounded independently of the
/// number of terms, so `sum(weekly)` and the last element of a running sum
/// over the same terms agree to the last few ulps.
pub fn neumaier_sum(values: &[f64]) -> f64 {
    let mut acc = CompensatedSum::default();
    for v in values {
        acc.add(*v);
    }
    acc.value()
}

/// Arithmetic mean using compensated summation. `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(neumaier_sum(values) / values.len() as f64)
}

/// Incremental Neumaier accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Running (prefix) sums with an initial offset, compensated.
///
/// `out[i] = offset + values[0] + ... + values[i]`.
pub fn cumulative_sum(offset: f64, values: &[f64]) -> Vec<f64> {
    let mut acc = CompensatedSum::default();
    acc.add(offset);
    values
        .iter()
        .map(|v| {
            acc.add(*v);
            acc.value()
        })
        .collect()
}

/// Relative approximate equality: `|a - b| <= rel_tol * max(|a|, |b|, 1)`.
///
/// The floor of 1 keeps comparisons near zero from demanding exact equality.
pub fn approx_eq_rel(a: f64, b: f64, rel_tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= rel_tol * scale
}

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Natural log of the Gamma function (log |Gamma(z)|).
///
/// Uses a Lanczos approximation with reflection for z < 0.5.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return f64::INFINITY;
    }
    if z == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if z <= 0.0 {
        let z_round = z.round();
        if (z - z_round).abs() < 1e-15 {
            return f64::NAN;
        }
    }
    if z < 0.5 {
        let sin_pi = (PI * z).sin();
        if sin_pi == 0.0 {
            return f64::NAN;
        }
        return PI.ln() - sin_pi.abs().ln() - log_gamma(1.0 - z);
    }

    let z_minus = z - 1.0;
    let mut x = LANCZOS_COEFFS[0];
    for (i, coeff) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        x += coeff / (z_minus + i as f64);
    }
    let t = z_minus + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (z_minus + 0.5) * t.ln() - t + x.ln()
}

/// log(n!) using the Gamma function.
pub fn log_factorial(n: u64) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    log_gamma((n as f64) + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn neumaier_recovers_cancelled_terms() {
        // Naive summation returns 0.0 here.
        let values = [1.0, 1e100, 1.0, -1e100];
        assert_eq!(neumaier_sum(&values), 2.0);
    }

    #[test]
    fn neumaier_empty_is_zero() {
        assert_eq!(neumaier_sum(&[]), 0.0);
    }

    #[test]
    fn mean_basic() {
        assert_eq!(mean(&[3.0, 5.0]), Some(4.0));
        assert_eq!(mean(&[0.0, 0.0, 6.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn cumulative_sum_with_offset() {
        let out = cumulative_sum(10.0, &[1.0, 2.0, 3.0]);
        assert_eq!(out, vec![11.0, 13.0, 16.0]);
    }

    #[test]
    fn cumulative_sum_empty() {
        assert!(cumulative_sum(5.0, &[]).is_empty());
    }

    #[test]
    fn cumulative_last_matches_sum() {
        let values: Vec<f64> = (0..500).map(|i| 0.1 + (i as f64) * 1e-3).collect();
        let cumulative = cumulative_sum(42.0, &values);
        let total = 42.0 + neumaier_sum(&values);
        assert!(approx_eq_rel(*cumulative.last().unwrap(), total, 1e-12));
    }

    #[test]
    fn approx_eq_rel_rules() {
        assert!(approx_eq_rel(1e9, 1e9 + 0.5, 1e-9));
        assert!(!approx_eq_rel(1e9, 1e9 + 10.0, 1e-9));
        assert!(approx_eq_rel(0.0, 1e-12, 1e-9));
        assert!(!approx_eq_rel(f64::NAN, f64::NAN, 1.0));
    }

    #[test]
    fn log_sum_exp_basic() {
        let out = log_sum_exp(&[0.0, 0.0]);
        assert!(approx_eq(out, 2.0f64.ln(), 1e-12));
    }

    #[test]
    fn log_sum_exp_all_neg_inf() {
        let out = log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        assert!(out.is_infinite() && out.is_sign_negative());
    }

    #[test]
    fn log_gamma_known_values() {
        assert!(approx_eq(log_gamma(1.0), 0.0, 1e-12));
        assert!(approx_eq(log_gamma(0.5), 0.5 * PI.ln(), 1e-10));
        assert!(approx_eq(log_gamma(5.0), 24.0f64.ln(), 1e-10));
    }

    #[test]
    fn log_factorial_small() {
        assert_eq!(log_factorial(0), 0.0);
        assert_eq!(log_factorial(1), 0.0);
        assert!(approx_eq(log_factorial(5), 120.0f64.ln(), 1e-12));
    }

    #[test]
    fn log_gamma_negative_integer_is_nan() {
        assert!(log_gamma(-2.0).is_nan());
    }
}
