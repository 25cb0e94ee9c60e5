#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and logic for the habit tracker and its activity simulator.

pub mod api;
/// Wire models for users, habits and completions.
pub mod model;
pub mod timestamp;
/// Payload validation.
pub mod validation;

mod util;

pub use util::{new_ulid, now_utc, parse_clock_time, CLOCK_TIME_FORMAT};
