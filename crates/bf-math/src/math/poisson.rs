//! Poisson distribution kernels.
//!
//! The simulator draws from `Poisson(λ)` through `rand_distr`; these closed
//! forms are what the draws are checked against.

use super::stable::{log_factorial, log_sum_exp};

/// log P(X = k) for X ~ Poisson(lambda).
///
/// `lambda = 0` is the point mass at 0. Negative or NaN rates return NaN.
pub fn poisson_log_pmf(k: u64, lambda: f64) -> f64 {
    if lambda.is_nan() || lambda < 0.0 {
        return f64::NAN;
    }
    if lambda == 0.0 {
        return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
    }
    if lambda.is_infinite() {
        return f64::NEG_INFINITY;
    }
    (k as f64) * lambda.ln() - lambda - log_factorial(k)
}

/// P(X = k) for X ~ Poisson(lambda).
pub fn poisson_pmf(k: u64, lambda: f64) -> f64 {
    poisson_log_pmf(k, lambda).exp()
}

/// P(X <= k) for X ~ Poisson(lambda), summed in log space.
pub fn poisson_cdf(k: u64, lambda: f64) -> f64 {
    if lambda.is_nan() || lambda < 0.0 {
        return f64::NAN;
    }
    let terms: Vec<f64> = (0..=k).map(|i| poisson_log_pmf(i, lambda)).collect();
    log_sum_exp(&terms).exp().min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pmf_known_values() {
        // P(X=0 | 4) = e^-4
        assert!((poisson_pmf(0, 4.0) - (-4.0f64).exp()).abs() < 1e-12);
        // P(X=2 | 3) = 9/2 e^-3
        assert!((poisson_pmf(2, 3.0) - 4.5 * (-3.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn zero_rate_is_point_mass() {
        assert_eq!(poisson_pmf(0, 0.0), 1.0);
        assert_eq!(poisson_pmf(1, 0.0), 0.0);
        assert_eq!(poisson_cdf(0, 0.0), 1.0);
    }

    #[test]
    fn negative_rate_is_nan() {
        assert!(poisson_log_pmf(1, -0.5).is_nan());
        assert!(poisson_cdf(1, -0.5).is_nan());
        assert!(poisson_pmf(1, f64::NAN).is_nan());
    }

    #[test]
    fn cdf_is_monotone_and_bounded() {
        let mut prev = 0.0;
        for k in 0..40 {
            let c = poisson_cdf(k, 5.0);
            assert!(c >= prev - 1e-15, "cdf decreased at k={k}");
            assert!(c <= 1.0);
            prev = c;
        }
        assert!((prev - 1.0).abs() < 1e-9);
    }
}
