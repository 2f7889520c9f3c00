//! Kaplan-Meier estimation and Peto-type milestone confidence intervals.

use fu_core::{Error, Result, validate_right_censoring_data};
use fu_prob::math::{exp_clamped, two_sided_z};

use crate::stepfn::StepFunction;

/// A single step in the Kaplan-Meier survival curve.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KaplanMeierStep {
    /// Event time.
    pub time: f64,
    /// Number at risk just before this time.
    pub n_risk: usize,
    /// Number of events at this time.
    pub n_events: usize,
    /// Number of censorings at this time.
    pub n_censored: usize,
    /// Kaplan-Meier survival estimate S(t) just after this time.
    pub survival: f64,
}

/// Result of the Kaplan-Meier estimator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KaplanMeierEstimate {
    /// Ordered steps of the survival curve (one per distinct event time).
    pub steps: Vec<KaplanMeierStep>,
    /// Median survival time (smallest t where S(t) <= 0.5), or `None` if
    /// the survival function never drops to 0.5.
    pub median: Option<f64>,
    /// Total number of observations.
    pub n: usize,
    /// Total number of events.
    pub n_events: usize,
    // All observation times sorted ascending; needed for strictly-before
    // risk-set queries at arbitrary milestones.
    sorted_times: Vec<f64>,
}

impl KaplanMeierEstimate {
    /// Largest observation time (event or censoring). The estimator is
    /// defined on `[0, max_time]`.
    #[inline]
    pub fn max_time(&self) -> f64 {
        *self.sorted_times.last().expect("estimate is never empty")
    }

    /// Right-continuous survival estimate S(t); 1 before the first event
    /// time. Carries the last value forward beyond `max_time`.
    pub fn survival_at(&self, t: f64) -> f64 {
        let idx = self.steps.partition_point(|s| s.time <= t);
        if idx == 0 { 1.0 } else { self.steps[idx - 1].survival }
    }

    /// S(t) restricted to the estimator's domain: `None` for `t` beyond the
    /// last observed time.
    pub fn survival_at_checked(&self, t: f64) -> Option<f64> {
        if t > self.max_time() { None } else { Some(self.survival_at(t)) }
    }

    /// Left limit S(t-): the estimate just before `t`.
    pub fn survival_before(&self, t: f64) -> f64 {
        let idx = self.steps.partition_point(|s| s.time < t);
        if idx == 0 { 1.0 } else { self.steps[idx - 1].survival }
    }

    /// Risk-set size just before `t`: observations with time `>= t`.
    pub fn n_at_risk_before(&self, t: f64) -> usize {
        self.n - self.sorted_times.partition_point(|&x| x < t)
    }

    /// `true` when `t` coincides exactly with any observation time.
    pub fn is_observed_time(&self, t: f64) -> bool {
        self.sorted_times.binary_search_by(|x| x.total_cmp(&t)).is_ok()
    }

    /// The survival curve as a step function over the event times.
    pub fn to_step_function(&self) -> StepFunction {
        let xs: Vec<f64> = self.steps.iter().map(|s| s.time).collect();
        let ys: Vec<f64> = self.steps.iter().map(|s| s.survival).collect();
        StepFunction::new(xs, ys).expect("KM steps are sorted with survival in [0,1]")
    }
}

/// Compute the Kaplan-Meier survival estimate.
///
/// At each distinct event time, `S(t) = S(t-) * (1 - d/n)` where `d` is the
/// number of events and `n` the number at risk just before `t`. Censorings
/// shrink the risk set at their own time without causing a drop. Within tied
/// times events are processed before censorings so that `n_risk` is correct
/// at each event time.
pub fn kaplan_meier(times: &[f64], events: &[bool]) -> Result<KaplanMeierEstimate> {
    validate_right_censoring_data(times, events)?;

    let n = times.len();
    let total_events = events.iter().filter(|&&e| e).count();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        times[a].total_cmp(&times[b]).then_with(|| {
            // events (true) sort before censorings (false)
            events[b].cmp(&events[a])
        })
    });

    let mut steps: Vec<KaplanMeierStep> = Vec::new();
    let mut n_risk = n;
    let mut s = 1.0_f64;

    let mut i = 0;
    while i < n {
        let t = times[order[i]];
        let mut d = 0usize;
        let mut c = 0usize;
        while i < n && times[order[i]] == t {
            if events[order[i]] {
                d += 1;
            } else {
                c += 1;
            }
            i += 1;
        }
        if d > 0 {
            s *= 1.0 - d as f64 / n_risk as f64;
            steps.push(KaplanMeierStep { time: t, n_risk, n_events: d, n_censored: c, survival: s });
        }
        n_risk -= d + c;
    }

    let median = steps.iter().find(|st| st.survival <= 0.5).map(|st| st.time);

    let mut sorted_times = times.to_vec();
    sorted_times.sort_by(f64::total_cmp);

    Ok(KaplanMeierEstimate { steps, median, n, n_events: total_events, sorted_times })
}

/// Survival estimate with a Peto-type confidence interval at one query time.
///
/// `None` fields flag a point where the quantity is undefined; they are never
/// silently defaulted.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MilestoneEstimate {
    /// Query time.
    pub time: f64,
    /// Survival estimate S(t0-), when defined.
    pub survival: Option<f64>,
    /// Lower confidence bound, when defined.
    pub lower: Option<f64>,
    /// Upper confidence bound, when defined.
    pub upper: Option<f64>,
}

impl MilestoneEstimate {
    fn undefined(time: f64) -> Self {
        Self { time, survival: None, lower: None, upper: None }
    }

    /// `true` when estimate and both bounds resolved.
    pub fn is_defined(&self) -> bool {
        self.survival.is_some() && self.lower.is_some() && self.upper.is_some()
    }
}

/// Evaluate a fitted curve at arbitrary query times with Peto-type intervals.
///
/// Per query time `t0`:
/// - `t0` strictly before the earliest observation: `S = 1`, bounds undefined;
/// - `t0` exactly at any observation time, or past the last one: fully
///   undefined (the left-limit convention is ambiguous on a probability mass);
/// - otherwise `S = S(t0-)`, `n` = risk set just before `t0`,
///   `Var = S^2 (1-S) / n`, `C = exp(z sqrt(Var) / (S^{3/2} (1-S)))`, and
///   `lower = S / ((1-C) S + C)`, `upper = C S / ((C-1) S + 1)`.
///
/// The transform keeps bounds inside `[0, 1]`; it degenerates when `S` is
/// exactly 0 or 1, in which case only the point estimate is reported.
/// Undefined points never poison the rest of the batch.
pub fn milestones(
    estimate: &KaplanMeierEstimate,
    query_times: &[f64],
    conf_level: f64,
) -> Result<Vec<MilestoneEstimate>> {
    let z = two_sided_z(conf_level)?;
    if query_times.iter().any(|t| !t.is_finite()) {
        return Err(Error::Validation("query times must be finite".to_string()));
    }

    let earliest = estimate.sorted_times[0];
    let latest = estimate.max_time();

    let out = query_times
        .iter()
        .map(|&t0| {
            if t0 < earliest {
                return MilestoneEstimate { time: t0, survival: Some(1.0), lower: None, upper: None };
            }
            if estimate.is_observed_time(t0) || t0 > latest {
                return MilestoneEstimate::undefined(t0);
            }

            let s = estimate.survival_before(t0);
            let n = estimate.n_at_risk_before(t0);
            if n == 0 || s <= 0.0 || s >= 1.0 {
                return MilestoneEstimate { time: t0, survival: Some(s), lower: None, upper: None };
            }

            let var = s * s * (1.0 - s) / n as f64;
            let c = exp_clamped(z * var.sqrt() / (s.powf(1.5) * (1.0 - s)));
            let lower = s / ((1.0 - c) * s + c);
            let upper = c * s / ((c - 1.0) * s + 1.0);
            MilestoneEstimate { time: t0, survival: Some(s), lower: Some(lower), upper: Some(upper) }
        })
        .collect();

    Ok(out)
}

/// Fit and evaluate in one call: the §6-style entry point.
pub fn kaplan_meier_milestones(
    times: &[f64],
    events: &[bool],
    query_times: &[f64],
    conf_level: f64,
) -> Result<Vec<MilestoneEstimate>> {
    let estimate = kaplan_meier(times, events)?;
    milestones(&estimate, query_times, conf_level)
}
