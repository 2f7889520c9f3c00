//! Exponential survival utilities for right-censored data.

use fu_core::{Error, Result, validate_right_censoring_data};

/// Log-PDF of an Exponential distribution at `x` with rate `rate`.
///
/// Support: `x >= 0`.
pub fn logpdf(x: f64, rate: f64) -> Result<f64> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::Validation(format!("rate must be finite and > 0, got {rate}")));
    }
    if x < 0.0 {
        return Ok(f64::NEG_INFINITY);
    }
    Ok(rate.ln() - rate * x)
}

/// Exponential survival function `S(t) = exp(-rate * t)`.
#[inline]
pub fn survival(t: f64, rate: f64) -> f64 {
    (-rate * t).exp()
}

/// Maximum-likelihood rate for right-censored exponential data.
///
/// The censored-exponential likelihood has the closed-form maximizer
/// `rate = n_events / sum(times)`, equivalently `-log S(t)/t` for the fitted
/// point survival at any `t`. Returns `None` when the sample carries no
/// events or zero total exposure — the rate is not identified there.
pub fn mle_rate_censored(times: &[f64], events: &[bool]) -> Result<Option<f64>> {
    validate_right_censoring_data(times, events)?;
    let sum_t: f64 = times.iter().sum();
    let n_events = events.iter().filter(|&&d| d).count();
    if n_events == 0 || sum_t <= 0.0 {
        return Ok(None);
    }
    Ok(Some(n_events as f64 / sum_t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_value() {
        let lp = logpdf(0.5, 2.0).unwrap();
        assert!((lp - (2.0f64.ln() - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_support() {
        let lp = logpdf(-0.1, 2.0).unwrap();
        assert!(lp.is_infinite() && lp.is_sign_negative());
    }

    #[test]
    fn test_invalid_rate() {
        assert!(logpdf(0.0, 0.0).is_err());
        assert!(logpdf(0.0, -1.0).is_err());
    }

    #[test]
    fn mle_rate_matches_events_over_exposure() {
        let times = [1.0, 2.0, 3.0, 4.0];
        let events = [true, false, true, false];
        let rate = mle_rate_censored(&times, &events).unwrap().unwrap();
        assert!((rate - 2.0 / 10.0).abs() < 1e-12);
    }

    #[test]
    fn mle_rate_unidentified_without_events() {
        let times = [1.0, 2.0];
        let events = [false, false];
        assert!(mle_rate_censored(&times, &events).unwrap().is_none());
    }

    #[test]
    fn survival_decreases() {
        let rate = 0.3;
        assert!((survival(0.0, rate) - 1.0).abs() < 1e-12);
        assert!(survival(1.0, rate) > survival(2.0, rate));
    }
}
