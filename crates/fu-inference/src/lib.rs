//! # fu-inference
//!
//! Follow-up quantification for right-censored time-to-event data.
//!
//! This crate provides:
//! - the seven-definition follow-up quantifier (including the Korn/Schemper
//!   potential-follow-up estimator)
//! - Kaplan-Meier estimation with Peto-type milestone confidence intervals
//! - a seeded, reproducible bootstrap for milestone survival differences
//! - extreme-scenario bounds for censoring assumptions
//!
//! ## Architecture
//!
//! Shared types and errors live in `fu-core`; numeric building blocks
//! (quantiles, normal helpers, the censored exponential model) in `fu-prob`.
//! Everything here takes immutable samples and returns newly constructed
//! results.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Bootstrap percentile intervals for milestone survival differences.
pub mod bootstrap;
/// The seven follow-up definitions and their medians.
pub mod followup;
/// Kaplan-Meier estimation and milestone confidence intervals.
pub mod km;
/// Extreme-scenario censoring bounds.
pub mod stability;
/// Empirical step functions.
pub mod stepfn;

pub use bootstrap::{BootstrapConfig, MilestoneDifferenceCi, milestone_difference_ci, resample_cases};
pub use followup::{
    FollowUpDistribution, FollowUpMeasure, FollowUpResult, quantify, quantify_follow_up,
};
pub use km::{
    KaplanMeierEstimate, KaplanMeierStep, MilestoneEstimate, kaplan_meier,
    kaplan_meier_milestones, milestones,
};
pub use stability::{StabilityScenarios, extreme_scenarios};
pub use stepfn::{StepFunction, survivor_function};
