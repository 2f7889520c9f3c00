//! Empirical step functions.
//!
//! A [`StepFunction`] is a right-continuous map from time to a value in
//! `[0, 1]`, stored as sorted abscissas with their ordinates. The survivor
//! builder computes `1 - ECDF` directly from the sorted sample — no estimator
//! internals are inspected.

use fu_core::{Error, Result};

/// Right-continuous step function with sorted abscissas and `y` in `[0, 1]`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StepFunction {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl StepFunction {
    /// Build from paired `(x, y)` vectors.
    ///
    /// Requires `xs` sorted ascending (ties allowed) and every `y` in
    /// `[0, 1]`. Monotonicity of `y` is a property of survivor-type inputs,
    /// not a construction requirement.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(Error::Validation(format!(
                "xs/ys length mismatch: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.iter().any(|x| !x.is_finite()) {
            return Err(Error::Validation("abscissas must be finite".to_string()));
        }
        if xs.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Validation("abscissas must be sorted ascending".to_string()));
        }
        if ys.iter().any(|y| !(0.0..=1.0).contains(y)) {
            return Err(Error::Validation("ordinates must lie in [0, 1]".to_string()));
        }
        Ok(Self { xs, ys })
    }

    /// The empty step function (identically 1 under [`Self::eval`]).
    pub fn empty() -> Self {
        Self { xs: Vec::new(), ys: Vec::new() }
    }

    /// Number of stored points.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// `true` when no points are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Abscissas.
    #[inline]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Ordinates.
    #[inline]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Right-continuous evaluation: the ordinate of the last point with
    /// `x <= t`, or 1 before the first point.
    pub fn eval(&self, t: f64) -> f64 {
        let idx = self.xs.partition_point(|&x| x <= t);
        if idx == 0 { 1.0 } else { self.ys[idx - 1] }
    }

    /// `true` when ordinates are non-increasing (within `tol`).
    pub fn is_non_increasing(&self, tol: f64) -> bool {
        self.ys.windows(2).all(|w| w[1] <= w[0] + tol)
    }

    /// Largest abscissa whose ordinate is still `>= level`, reading the
    /// function from the right. `None` if no point reaches the level.
    pub fn largest_x_with_y_at_least(&self, level: f64) -> Option<f64> {
        self.xs
            .iter()
            .zip(self.ys.iter())
            .rev()
            .find(|(_, &y)| y >= level)
            .map(|(&x, _)| x)
    }
}

/// Build the empirical survivor function of a sample: at each sorted sample
/// point `x`, the proportion of the sample strictly greater than `x`.
///
/// Repeated values are kept as repeated abscissas; right-continuous
/// evaluation resolves ties to the strictly-greater proportion.
pub fn survivor_function(sample: &[f64]) -> Result<StepFunction> {
    if sample.is_empty() {
        return Err(Error::Validation("sample must be non-empty".to_string()));
    }
    if sample.iter().any(|x| !x.is_finite()) {
        return Err(Error::Validation("sample must contain only finite values".to_string()));
    }

    let n = sample.len();
    let mut xs = sample.to_vec();
    xs.sort_by(f64::total_cmp);
    let ys: Vec<f64> = (0..n).map(|i| 1.0 - (i + 1) as f64 / n as f64).collect();
    StepFunction::new(xs, ys)
}
