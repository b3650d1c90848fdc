//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_helpers;
pub mod error;
pub mod signal;
pub mod external;
pub mod config;
pub mod config_validation;
pub mod snapshot;
pub mod contradiction;
pub mod adjustment;
pub mod scoring;
pub mod sizing;
pub mod bounce;
pub mod expected_value;
pub mod pipeline;
