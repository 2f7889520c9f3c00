//! Common data types for FollowQuant

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Outcome classification for a subject at the clinical cutoff.
///
/// Exactly one status applies per subject. The two censoring causes are kept
/// distinct because the Korn potential-follow-up estimator treats loss to
/// follow-up as its event of interest, while administrative censoring only
/// shrinks risk sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    /// The primary event of interest was observed.
    Event,
    /// The subject was lost to follow-up before the cutoff.
    LostToFollowUp,
    /// The subject was event-free and on study at the clinical cutoff.
    AdminCensored,
}

impl EventStatus {
    /// Parse from string ("event", "ltfu", "admin").
    pub fn parse_str(s: &str) -> Result<Self> {
        match s {
            "event" => Ok(EventStatus::Event),
            "ltfu" => Ok(EventStatus::LostToFollowUp),
            "admin" => Ok(EventStatus::AdminCensored),
            _ => Err(Error::Validation(format!("unknown event status: '{s}'"))),
        }
    }

    /// `true` if the primary event was observed.
    #[inline]
    pub fn is_event(self) -> bool {
        matches!(self, EventStatus::Event)
    }

    /// `true` if the subject was censored for any reason.
    #[inline]
    pub fn is_censored(self) -> bool {
        !self.is_event()
    }

    /// `true` if the subject was lost to follow-up.
    #[inline]
    pub fn is_lost_to_followup(self) -> bool {
        matches!(self, EventStatus::LostToFollowUp)
    }
}

/// Time unit for converting calendar-date differences into analysis time.
///
/// Months and years use the mean Gregorian month (30.4375 days) and year
/// (365.25 days), the usual clinical-reporting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Calendar days.
    Days,
    /// 7-day weeks.
    Weeks,
    /// Mean Gregorian months (30.4375 days).
    Months,
    /// Mean Gregorian years (365.25 days).
    Years,
}

impl TimeUnit {
    /// Number of days per unit.
    #[inline]
    pub fn days(self) -> f64 {
        match self {
            TimeUnit::Days => 1.0,
            TimeUnit::Weeks => 7.0,
            TimeUnit::Months => 30.4375,
            TimeUnit::Years => 365.25,
        }
    }

    /// Signed difference `to - from` expressed in this unit.
    #[inline]
    pub fn between(self, from: NaiveDate, to: NaiveDate) -> f64 {
        (to - from).num_days() as f64 / self.days()
    }
}

/// A single subject's follow-up record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// Randomization date.
    pub randomization: NaiveDate,
    /// Observed time from randomization to event or censoring.
    pub observed_time: f64,
    /// Outcome classification at the cutoff.
    pub status: EventStatus,
}

impl SubjectRecord {
    /// Potential follow-up: elapsed time from randomization to the clinical
    /// cutoff date, in `unit`.
    ///
    /// # Errors
    /// Returns a validation error when the cutoff precedes randomization.
    pub fn potential_followup(&self, cutoff: NaiveDate, unit: TimeUnit) -> Result<f64> {
        let pfu = unit.between(self.randomization, cutoff);
        if pfu < 0.0 {
            return Err(Error::Validation(format!(
                "cutoff {} precedes randomization {}",
                cutoff, self.randomization
            )));
        }
        Ok(pfu)
    }
}

/// A right-censored sample: paired observation times and event indicators.
///
/// `events[i] = true` denotes the event of interest *for the sample's
/// purpose* — the same subject-level data is reinterpreted under different
/// event definitions (primary event, any censoring, loss to follow-up) by
/// different estimators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CensoredSample {
    /// Observation times (finite, >= 0).
    pub times: Vec<f64>,
    /// Event indicators aligned with `times`.
    pub events: Vec<bool>,
}

impl CensoredSample {
    /// Build a validated sample from paired vectors.
    pub fn new(times: Vec<f64>, events: Vec<bool>) -> Result<Self> {
        validate_right_censoring_data(&times, &events)?;
        Ok(Self { times, events })
    }

    /// Number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// `true` when the sample holds no observations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of observed events.
    #[inline]
    pub fn n_events(&self) -> usize {
        self.events.iter().filter(|&&e| e).count()
    }

    /// Iterate over `(time, event)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, bool)> + '_ {
        self.times.iter().copied().zip(self.events.iter().copied())
    }
}

/// Validate paired right-censoring data.
#[inline]
pub fn validate_right_censoring_data(times: &[f64], events: &[bool]) -> Result<()> {
    if times.is_empty() {
        return Err(Error::Validation("times must be non-empty".to_string()));
    }
    if times.len() != events.len() {
        return Err(Error::Validation(format!(
            "times/events length mismatch: {} vs {}",
            times.len(),
            events.len()
        )));
    }
    if times.iter().any(|t| !t.is_finite() || *t < 0.0) {
        return Err(Error::Validation("times must be finite and >= 0".to_string()));
    }
    Ok(())
}
