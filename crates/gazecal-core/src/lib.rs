//! Core types and configuration for `gaze-drift-rs`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Pt2`, `Mat3`, ...),
//! - the value types passed between pipeline stages (gaze records,
//!   compressed samples, calibration intervals, error series),
//! - the calibration marker table,
//! - the immutable analysis configuration with one-shot validation,
//! - the error taxonomy shared across stages.
//!
//! Pipeline:
//! `gaze stream -> gap filter -> frame compressor -> error aggregation -> drift model`
//!
//! All entities here are value data: created by one stage, consumed by the
//! next, never shared mutably.

/// Immutable analysis configuration.
pub mod config;
/// Error taxonomy shared across pipeline stages.
pub mod error;
/// Calibration marker table.
pub mod markers;
/// Linear algebra type aliases and helpers.
pub mod math;
/// Value types exchanged between pipeline stages.
pub mod types;

pub use config::*;
pub use error::*;
pub use markers::*;
pub use math::*;
pub use types::*;
