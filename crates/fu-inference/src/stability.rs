//! Extreme-scenario bounds for censoring assumptions.
//!
//! The Kaplan-Meier estimator assumes censoring is uninformative; that
//! assumption is unverifiable from the data. The two scenarios here bound the
//! range of survival curves compatible with any resolution of the censored
//! observations.

use fu_core::{CensoredSample, Result, validate_right_censoring_data};

/// The two bounding scenarios for a censored sample.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StabilityScenarios {
    /// Most pessimistic: every censored subject has the event at its own
    /// censoring time.
    pub lower: CensoredSample,
    /// Most optimistic: every censored subject observed before the last
    /// event time stays event-free through it.
    pub upper: CensoredSample,
}

/// Construct the extreme censoring scenarios.
///
/// - Lower scenario: every censored observation is reclassified as an event
///   at its own time.
/// - Upper scenario: every censored observation with time strictly before the
///   largest observed *event* time has its time extended to that event time,
///   remaining censored. A sample with no events leaves the upper scenario
///   unchanged.
///
/// Both scenarios are independent transforms of the input; feed each to
/// [`crate::km::kaplan_meier`] to obtain the bounding curves.
pub fn extreme_scenarios(times: &[f64], events: &[bool]) -> Result<StabilityScenarios> {
    validate_right_censoring_data(times, events)?;

    let lower = CensoredSample { times: times.to_vec(), events: vec![true; times.len()] };

    let max_event_time = times
        .iter()
        .zip(events.iter())
        .filter(|(_, &e)| e)
        .map(|(&t, _)| t)
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |m| m.max(t))));

    let upper_times: Vec<f64> = match max_event_time {
        Some(m) => times
            .iter()
            .zip(events.iter())
            .map(|(&t, &e)| if !e && t < m { m } else { t })
            .collect(),
        None => times.to_vec(),
    };
    let upper = CensoredSample { times: upper_times, events: events.to_vec() };

    Ok(StabilityScenarios { lower, upper })
}
