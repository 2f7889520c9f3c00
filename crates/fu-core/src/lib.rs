//! # fu-core
//!
//! Core types and errors for FollowQuant.
//!
//! This crate holds the pieces shared across the workspace:
//! - the error type and `Result` alias
//! - the subject-level data model (event status, subject records, censored
//!   samples, time units)
//!
//! Estimators live in `fu-inference`; probability building blocks in
//! `fu-prob`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    CensoredSample, EventStatus, SubjectRecord, TimeUnit, validate_right_censoring_data,
};
