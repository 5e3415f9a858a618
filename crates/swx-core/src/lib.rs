//! Core data types and series reconciliation for space-weather indices
//!
//! This crate provides the observation/batch/series model shared by all
//! sources and the merge procedure that reconciles an archived historical
//! series with a provisional current-period series.

pub mod merge;
pub mod types;

pub use merge::*;
pub use types::*;
