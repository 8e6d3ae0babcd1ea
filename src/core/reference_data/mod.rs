//! Compiled-in calibration data for the audit engine.
//!
//! Nothing in here carries logic beyond lookups; changing a value here changes the
//! engine's output, so these are constants rather than configuration.

pub mod climate;
pub mod ecm_catalog;
pub mod end_use_split;
pub mod eui;
pub mod utility_rates;
