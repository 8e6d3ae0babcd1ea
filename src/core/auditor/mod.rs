//! On-site audit mode: persisted audit snapshots, the store that holds them, and
//! recommendations generated from what the auditor recorded.

pub mod ecm_generator;
pub mod record;
pub mod store;
