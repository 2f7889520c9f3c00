//! Empirical quantiles and standard-normal helpers.

use fu_core::{Error, Result};
use statrs::distribution::{ContinuousCDF, Normal};

const PROB_EPS: f64 = 1e-12;

#[inline]
fn standard_normal() -> Normal {
    // Safe by construction for mean=0, sigma=1.
    Normal::new(0.0, 1.0).expect("standard normal should be constructible")
}

#[inline]
fn clip_prob(p: f64) -> f64 {
    p.clamp(PROB_EPS, 1.0 - PROB_EPS)
}

/// Standard normal quantile `Phi^{-1}(p)` with probability clipping.
#[inline]
pub fn inv_norm_cdf(p: f64) -> f64 {
    standard_normal().inverse_cdf(clip_prob(p))
}

/// Standard normal CDF `Phi(z)`.
#[inline]
pub fn norm_cdf(z: f64) -> f64 {
    standard_normal().cdf(z)
}

/// Two-sided critical value `z_{1-alpha/2}` for a confidence level in (0, 1).
pub fn two_sided_z(conf_level: f64) -> Result<f64> {
    if !(conf_level.is_finite() && conf_level > 0.0 && conf_level < 1.0) {
        return Err(Error::Validation(format!("conf_level must be in (0,1), got {conf_level}")));
    }
    Ok(inv_norm_cdf(1.0 - (1.0 - conf_level) / 2.0))
}

/// Quantile for sorted data via linear interpolation.
///
/// - `q=0` returns min
/// - `q=1` returns max
/// - empty input returns `NaN`
pub fn quantile_linear_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let i = pos.floor() as usize;
    let j = pos.ceil() as usize;
    if i == j {
        return sorted[i];
    }
    let t = pos - i as f64;
    (1.0 - t) * sorted[i] + t * sorted[j]
}

/// Quantile via sorting + linear interpolation.
pub fn quantile_linear(data: &[f64], q: f64) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let mut v = data.to_vec();
    v.sort_by(f64::total_cmp);
    quantile_linear_sorted(&v, q)
}

/// Exponential with a conservative clamp to avoid overflow.
///
/// For `x > 700`, `exp(x)` can overflow to `inf`; clamping keeps downstream
/// interval transforms finite so they degrade to the [0, 1] boundaries.
#[inline]
pub fn exp_clamped(x: f64) -> f64 {
    x.clamp(-700.0, 700.0).exp()
}

/// Sample median: middle order statistic, or the average of the two central
/// order statistics for even n. Empty input returns `NaN`.
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let mut v = data.to_vec();
    v.sort_by(f64::total_cmp);
    let n = v.len();
    if n % 2 == 1 { v[n / 2] } else { 0.5 * (v[n / 2 - 1] + v[n / 2]) }
}

/// Percentile interval from a set of bootstrap statistics.
pub fn percentile_interval(samples: &[f64], conf_level: f64) -> Result<(f64, f64)> {
    if samples.len() < 2 {
        return Err(Error::Validation(
            "percentile_interval requires at least 2 samples".to_string(),
        ));
    }
    if !(conf_level.is_finite() && conf_level > 0.0 && conf_level < 1.0) {
        return Err(Error::Validation(format!("conf_level must be in (0,1), got {conf_level}")));
    }

    let alpha = (1.0 - conf_level) / 2.0;
    let lo = quantile_linear(samples, alpha);
    let hi = quantile_linear(samples, 1.0 - alpha);
    Ok((lo.min(hi), lo.max(hi)))
}
