//! Inspection Report: weighted aggregation of inspection results
//!
//! Rolls per-segment count, mean and pass-rate records for a production
//! batch up into normalized statistics for each inspection station.

pub mod cli;
pub mod core;
