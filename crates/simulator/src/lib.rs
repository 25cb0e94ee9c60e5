#![forbid(unsafe_code)]

//! Habit activity simulator: a small control surface over a background loop
//! that feeds synthetic habits and completions into the activity store.

pub mod catalog;
pub mod config;
pub mod controller;
mod generation;
pub mod http;
pub mod log_buffer;
pub mod store_client;

pub use catalog::{Catalog, TaskTemplate};
pub use config::SimulatorConfig;
pub use controller::{SimError, Simulator};
pub use generation::{completion_payload, habit_payload};
pub use store_client::{ActivityStore, ClientError, HttpActivityStore};
