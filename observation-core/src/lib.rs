//! Core library for the `observations` CLI.
//!
//! This crate defines:
//! - The observation data model and its wire encoding
//! - The access layer for the remote observations service
//! - The create/edit form controller
//! - Configuration handling
//!
//! It is used by `observation-cli`, but can also back other front ends.

pub mod api;
pub mod cancel;
pub mod config;
pub mod form;
pub mod model;

#[cfg(test)]
mod testing;

pub use api::{ApiError, ObservationsApi, Outcome};
pub use cancel::CancellationToken;
pub use config::Config;
pub use form::{DraftMode, Field, Navigator, ObservationForm, SubmitStatus};
pub use model::{Observation, ObservationId, SkyCondition, TemperatureUnit};
