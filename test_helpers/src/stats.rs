//! Statistical checks for simulated realizations
//!
//! Normality of real and imaginary parts and correlation between arrays,
//! used by tests to validate random draws.

use scilib::math::basic::erf;
use std::f64::consts::SQRT_2;

/// Cumulative distribution function for standard normal distribution
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

/// Kolmogorov-Smirnov statistic against a normal distribution
///
/// The sample is standardized to zero mean and unit variance first, so this
/// tests the shape of the distribution rather than its scale. Returns 1.0 for
/// empty or constant samples.
pub fn ks_test_normal(samples: &[f64]) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 1.0;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean: f64 = sorted.iter().sum::<f64>() / n as f64;
    let variance: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    if std_dev < 1e-300 {
        return 1.0;
    }

    sorted
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let theoretical = normal_cdf((value - mean) / std_dev);
            let before = i as f64 / n as f64;
            let after = (i + 1) as f64 / n as f64;
            (before - theoretical).abs().max((after - theoretical).abs())
        })
        .fold(0.0, f64::max)
}

/// Asymptotic critical value of the KS statistic at significance `alpha`
///
/// Supports alpha of 0.10, 0.05 and 0.01; anything else uses 0.05.
pub fn ks_critical_value(n: usize, alpha: f64) -> f64 {
    let c_alpha = match alpha {
        a if (a - 0.10).abs() < 1e-6 => 1.22,
        a if (a - 0.01).abs() < 1e-6 => 1.63,
        _ => 1.36,
    };

    c_alpha / (n as f64).sqrt()
}

/// Pearson correlation coefficient between two samples
///
/// Returns NaN for mismatched or empty inputs, or if either sample has no
/// variance.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return f64::NAN;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (cov, var_x, var_y) = x.iter().zip(y).fold((0.0, 0.0, 0.0), |acc, (a, b)| {
        let dx = a - mean_x;
        let dy = b - mean_y;
        (acc.0 + dx * dy, acc.1 + dx * dx, acc.2 + dy * dy)
    });

    if var_x <= 0.0 || var_y <= 0.0 {
        return f64::NAN;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal, Uniform};

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((normal_cdf(1.0) - 0.8413447461).abs() < 1e-6);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 0.001);
    }

    #[test]
    fn test_ks_accepts_gaussian_draws() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples: Vec<f64> = (0..2000).map(|_| StandardNormal.sample(&mut rng)).collect();

        let ks_stat = ks_test_normal(&samples);
        assert!(ks_stat < ks_critical_value(samples.len(), 0.01));
    }

    #[test]
    fn test_ks_rejects_uniform_draws() {
        let mut rng = StdRng::seed_from_u64(11);
        let uniform = Uniform::new(-1.0, 1.0);
        let samples: Vec<f64> = (0..2000).map(|_| uniform.sample(&mut rng)).collect();

        let ks_stat = ks_test_normal(&samples);
        assert!(ks_stat > ks_critical_value(samples.len(), 0.01));
    }

    #[test]
    fn test_ks_degenerate_inputs() {
        assert_eq!(ks_test_normal(&[]), 1.0);
        assert_eq!(ks_test_normal(&[5.0; 10]), 1.0);
    }

    #[test]
    fn test_ks_critical_values() {
        assert!((ks_critical_value(100, 0.05) - 0.136).abs() < 0.001);
        assert!((ks_critical_value(100, 0.01) - 0.163).abs() < 0.001);
    }

    #[test]
    fn test_pearson_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((pearson_correlation(&x, &[2.0, 4.0, 6.0, 8.0, 10.0]) - 1.0).abs() < 1e-12);
        assert!((pearson_correlation(&x, &[10.0, 8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        assert!(pearson_correlation(&x, &[1.0, 2.0]).is_nan());
        assert!(pearson_correlation(&[5.0; 4], &[1.0, 2.0, 3.0, 4.0]).is_nan());
    }
}
