//! Core data types, unit conversions, and daily aggregation for weather ETL
//!
//! This crate turns one Open-Meteo style time-series payload into an
//! ordered list of per-day records. It performs no I/O; fetching, export,
//! and persistence live behind the traits in [`pipeline`].

pub mod aggregator;
pub mod pipeline;
pub mod rollups;
pub mod types;
pub mod units;

pub use aggregator::*;
pub use pipeline::*;
pub use rollups::*;
pub use types::*;
pub use units::*;
