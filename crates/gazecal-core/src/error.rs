//! Error taxonomy shared across pipeline stages.
//!
//! Stage-local failures (one marker, one session) never abort sibling work;
//! the per-subject boundary records them into a failure manifest and
//! continues. The enums here classify failures along that policy:
//! preconditions on inputs, malformed data shapes, and numerically
//! degenerate results.

use thiserror::Error;

use crate::math::Real;

/// Configuration rejected at startup validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: Real },
    #[error("fade threshold {fade} must not be below visible threshold {visible}")]
    InvertedThresholds { visible: Real, fade: Real },
    #[error("{name} must be in (0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: Real },
    #[error("max_clusters must be at least 2, got {value}")]
    TooFewClusters { value: usize },
    #[error("marker table needs a center plus at least 4 outer markers, got {found}")]
    TooFewMarkers { found: usize },
}

/// A required session input is missing or ambiguous.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreconditionError {
    #[error("no record source found for session {session}")]
    MissingRecords { session: String },
    #[error("expected exactly one record source for session {session}, found {found}")]
    AmbiguousRecords { session: String, found: usize },
    #[error("no brightness data found for session {session}")]
    MissingBrightness { session: String },
}

/// Input data has an unusable shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataShapeError {
    #[error("cannot compress an empty gaze stream")]
    EmptyStream,
    #[error("error series length mismatch: {x} x values vs {y} y values")]
    LengthMismatch { x: usize, y: usize },
    #[error("marker {marker} has {have} session averages, drift fit needs at least {need}")]
    InsufficientSessions {
        marker: String,
        have: usize,
        need: usize,
    },
}

/// A computation survived no data.
///
/// Raised only where a numeric value is demanded; the averaging path
/// represents the same condition as `None` instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DegenerateError {
    #[error("no data survives filtering for marker {marker}")]
    NoSurvivingData { marker: String },
}
