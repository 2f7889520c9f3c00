//! Multi-definition follow-up quantification.
//!
//! "How long were subjects followed?" has no single answer in censored data.
//! This module computes seven statistically distinct definitions as empirical
//! distributions with their medians, from the naive observation-time
//! distribution up to the Korn/Schemper potential-follow-up estimator.

use chrono::NaiveDate;
use fu_core::{Error, EventStatus, Result, TimeUnit};
use fu_prob::math;

use crate::km::{KaplanMeierEstimate, kaplan_meier};
use crate::stepfn::{StepFunction, survivor_function};

/// The seven follow-up definitions, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FollowUpMeasure {
    /// Observation time regardless of censoring.
    ObservationTime,
    /// Observation time restricted to event-free subjects.
    ObservationTimeEventFree,
    /// Time to censoring: reverse Kaplan-Meier with censoring-for-any-reason
    /// as the event.
    TimeToCensoring,
    /// Time from randomization to the clinical cutoff (potential follow-up).
    TimeToCutoff,
    /// Observed time if censored, potential follow-up if the event occurred.
    KnownFunctionTime,
    /// Korn/Schemper potential follow-up, adjusted for loss to follow-up.
    KornPotentialFollowUp,
    /// Potential follow-up if censored, observed time if the event occurred.
    PotentialFollowUpConsideringEvents,
}

impl FollowUpMeasure {
    /// All measures in reporting order.
    pub const ALL: [FollowUpMeasure; 7] = [
        FollowUpMeasure::ObservationTime,
        FollowUpMeasure::ObservationTimeEventFree,
        FollowUpMeasure::TimeToCensoring,
        FollowUpMeasure::TimeToCutoff,
        FollowUpMeasure::KnownFunctionTime,
        FollowUpMeasure::KornPotentialFollowUp,
        FollowUpMeasure::PotentialFollowUpConsideringEvents,
    ];

    /// Human-readable label for the medians table.
    pub fn label(self) -> &'static str {
        match self {
            FollowUpMeasure::ObservationTime => "observation time regardless of censoring",
            FollowUpMeasure::ObservationTimeEventFree => "observation time for event-free subjects",
            FollowUpMeasure::TimeToCensoring => "time to censoring (reverse Kaplan-Meier)",
            FollowUpMeasure::TimeToCutoff => "time to clinical cutoff",
            FollowUpMeasure::KnownFunctionTime => "known function time",
            FollowUpMeasure::KornPotentialFollowUp => "Korn potential follow-up",
            FollowUpMeasure::PotentialFollowUpConsideringEvents => {
                "potential follow-up considering events"
            }
        }
    }
}

/// One follow-up definition: its empirical distribution and median.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FollowUpDistribution {
    /// Which definition this distribution realises.
    pub measure: FollowUpMeasure,
    /// Empirical survivor-type curve of the derived sample.
    pub curve: StepFunction,
    /// Median of the definition (`None` when undefined, e.g. an empty
    /// event-free subset or a Korn curve that never reaches 0.5).
    pub median: Option<f64>,
}

/// All seven follow-up distributions for one analysis cutoff.
///
/// Constructed once per quantification call from an immutable input sample;
/// never mutated afterwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FollowUpResult {
    /// The seven distributions, ordered as [`FollowUpMeasure::ALL`].
    pub distributions: Vec<FollowUpDistribution>,
    /// The full reverse-KM fit behind [`FollowUpMeasure::TimeToCensoring`].
    pub censoring_km: KaplanMeierEstimate,
}

impl FollowUpResult {
    /// The distribution for one measure.
    pub fn distribution(&self, measure: FollowUpMeasure) -> &FollowUpDistribution {
        let idx = FollowUpMeasure::ALL.iter().position(|&m| m == measure).expect("measure in ALL");
        &self.distributions[idx]
    }

    /// Labelled medians table in reporting order.
    pub fn medians(&self) -> Vec<(&'static str, Option<f64>)> {
        self.distributions.iter().map(|d| (d.measure.label(), d.median)).collect()
    }
}

fn validate_quantify_inputs(
    observed_times: &[f64],
    statuses: &[EventStatus],
    potential_followup: &[f64],
) -> Result<()> {
    let n = observed_times.len();
    if n == 0 {
        return Err(Error::Validation("observed_times must be non-empty".to_string()));
    }
    if statuses.len() != n || potential_followup.len() != n {
        return Err(Error::Validation(format!(
            "input length mismatch: {} observed times, {} statuses, {} potential follow-up times",
            n,
            statuses.len(),
            potential_followup.len()
        )));
    }
    if observed_times.iter().any(|t| !t.is_finite() || *t < 0.0) {
        return Err(Error::Validation("observed times must be finite and >= 0".to_string()));
    }
    if potential_followup.iter().any(|t| !t.is_finite() || *t < 0.0) {
        return Err(Error::Validation(
            "potential follow-up times must be finite and >= 0".to_string(),
        ));
    }
    Ok(())
}

/// Quantify follow-up from subject-level dates.
///
/// Potential follow-up is derived per subject as `cutoff - randomization`
/// expressed in `unit`; `observed_times` must already be in the same unit.
pub fn quantify_follow_up(
    randomization_dates: &[NaiveDate],
    observed_times: &[f64],
    statuses: &[EventStatus],
    cutoff_date: NaiveDate,
    unit: TimeUnit,
) -> Result<FollowUpResult> {
    if randomization_dates.len() != observed_times.len() {
        return Err(Error::Validation(format!(
            "input length mismatch: {} randomization dates, {} observed times",
            randomization_dates.len(),
            observed_times.len()
        )));
    }
    let potential: Vec<f64> = randomization_dates
        .iter()
        .map(|&r| {
            let pfu = unit.between(r, cutoff_date);
            if pfu < 0.0 {
                return Err(Error::Validation(format!(
                    "cutoff {cutoff_date} precedes randomization {r}"
                )));
            }
            Ok(pfu)
        })
        .collect::<Result<_>>()?;
    quantify(observed_times, statuses, &potential)
}

/// Quantify follow-up from observed times, statuses, and precomputed
/// potential follow-up times (all in one consistent unit).
pub fn quantify(
    observed_times: &[f64],
    statuses: &[EventStatus],
    potential_followup: &[f64],
) -> Result<FollowUpResult> {
    validate_quantify_inputs(observed_times, statuses, potential_followup)?;

    // 1. Observation time regardless of censoring.
    let observation = sample_distribution(FollowUpMeasure::ObservationTime, observed_times)?;

    // 2. Observation time for event-free subjects.
    let event_free_times: Vec<f64> = observed_times
        .iter()
        .zip(statuses.iter())
        .filter(|(_, s)| s.is_censored())
        .map(|(&t, _)| t)
        .collect();
    let event_free = if event_free_times.is_empty() {
        FollowUpDistribution {
            measure: FollowUpMeasure::ObservationTimeEventFree,
            curve: StepFunction::empty(),
            median: None,
        }
    } else {
        sample_distribution(FollowUpMeasure::ObservationTimeEventFree, &event_free_times)?
    };

    // 3. Time to censoring: reverse KM, censoring-for-any-reason as event.
    let censoring_indicator: Vec<bool> = statuses.iter().map(|s| s.is_censored()).collect();
    let censoring_km = kaplan_meier(observed_times, &censoring_indicator)?;
    let time_to_censoring = FollowUpDistribution {
        measure: FollowUpMeasure::TimeToCensoring,
        curve: censoring_km.to_step_function(),
        median: censoring_km.median,
    };

    // 4. Time to clinical cutoff.
    let time_to_cutoff = sample_distribution(FollowUpMeasure::TimeToCutoff, potential_followup)?;

    // 5. Known function time: censoring time where known, potential
    // follow-up where the event cut observation short.
    let known: Vec<f64> = observed_times
        .iter()
        .zip(statuses.iter())
        .zip(potential_followup.iter())
        .map(|((&t, s), &pfu)| if s.is_censored() { t } else { pfu })
        .collect();
    let known_function = sample_distribution(FollowUpMeasure::KnownFunctionTime, &known)?;

    // 6. Korn potential follow-up.
    let (korn_curve, korn_median) =
        korn_potential_followup(observed_times, statuses, potential_followup)?;
    let korn = FollowUpDistribution {
        measure: FollowUpMeasure::KornPotentialFollowUp,
        curve: korn_curve,
        median: korn_median,
    };

    // 7. Potential follow-up considering events.
    let considering_events: Vec<f64> = observed_times
        .iter()
        .zip(statuses.iter())
        .zip(potential_followup.iter())
        .map(|((&t, s), &pfu)| if s.is_event() { t } else { pfu })
        .collect();
    let potential_considering_events = sample_distribution(
        FollowUpMeasure::PotentialFollowUpConsideringEvents,
        &considering_events,
    )?;

    Ok(FollowUpResult {
        distributions: vec![
            observation,
            event_free,
            time_to_censoring,
            time_to_cutoff,
            known_function,
            korn,
            potential_considering_events,
        ],
        censoring_km,
    })
}

fn sample_distribution(measure: FollowUpMeasure, sample: &[f64]) -> Result<FollowUpDistribution> {
    Ok(FollowUpDistribution {
        measure,
        curve: survivor_function(sample)?,
        median: Some(math::median(sample)),
    })
}

/// The Korn/Schemper potential-follow-up step function and its median.
///
/// For each sorted potential-follow-up value `t'`:
/// - `p(t')` is the proportion of subjects with potential follow-up
///   strictly greater than `t'`;
/// - `q(t')` is the loss-to-follow-up Kaplan-Meier survival fitted on the
///   subset with potential follow-up `>= t'`, evaluated at the subset's first
///   observed time strictly greater than `t'` (0 when no such time exists).
///
/// The product `p * q` forms the curve; the median is the largest `t'` whose
/// product is still `>= 0.5` (the curve read from the right).
///
/// The subset shrinks monotonically along the sorted pass, so each distinct
/// `t'` refits on a suffix of the potential-follow-up ordering.
fn korn_potential_followup(
    observed_times: &[f64],
    statuses: &[EventStatus],
    potential_followup: &[f64],
) -> Result<(StepFunction, Option<f64>)> {
    let n = potential_followup.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| potential_followup[a].total_cmp(&potential_followup[b]));
    let sorted_pfu: Vec<f64> = order.iter().map(|&i| potential_followup[i]).collect();

    let mut ys = vec![0.0_f64; n];
    let mut start = 0;
    while start < n {
        let tp = sorted_pfu[start];
        let mut end = start;
        while end < n && sorted_pfu[end] == tp {
            end += 1;
        }

        let p = (n - end) as f64 / n as f64;
        let subset = &order[start..];
        let times: Vec<f64> = subset.iter().map(|&i| observed_times[i]).collect();
        let ltfu: Vec<bool> =
            subset.iter().map(|&i| statuses[i].is_lost_to_followup()).collect();

        let eval_t = times.iter().copied().filter(|&t| t > tp).fold(f64::INFINITY, f64::min);
        let q = if times.is_empty() || !eval_t.is_finite() {
            0.0
        } else {
            kaplan_meier(&times, &ltfu)?.survival_at(eval_t)
        };

        let y = (p * q).clamp(0.0, 1.0);
        for slot in &mut ys[start..end] {
            *slot = y;
        }
        start = end;
    }

    let curve = StepFunction::new(sorted_pfu, ys)?;
    let median = curve.largest_x_with_y_at_least(0.5);
    Ok((curve, median))
}
