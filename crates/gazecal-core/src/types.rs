//! Value types exchanged between pipeline stages.

use serde::{Deserialize, Serialize};

use crate::math::Real;

/// One raw gaze measurement mapped onto the calibration surface.
///
/// Coordinates are normalized to `[0,1]×[0,1]` with the origin at the
/// bottom-left corner and y increasing upward. Several records may share a
/// `frame_index` when the eye camera runs faster than the world camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeRecord {
    /// Index of the world video frame the measurement falls on.
    pub frame_index: u64,
    /// Gaze timestamp in seconds.
    pub timestamp: Real,
    /// Normalized horizontal position.
    pub x: Real,
    /// Normalized vertical position.
    pub y: Real,
}

/// A pre-computed fixation interval from the capture export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationRecord {
    pub start_frame: u64,
    pub end_frame: u64,
    /// Representative normalized horizontal position.
    pub x: Real,
    /// Representative normalized vertical position.
    pub y: Real,
}

/// The gaze and fixation rows of one calibration session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecords {
    pub gaze: Vec<GazeRecord>,
    pub fixations: Vec<FixationRecord>,
}

/// A merged run of measurement gaps in the gaze stream.
///
/// Individual gaps closer together than the clustering threshold are merged
/// into one cluster; `count` is the number of merged gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapCluster {
    pub count: usize,
    pub start_time: Real,
    pub end_time: Real,
}

impl GapCluster {
    /// Span of the cluster in seconds.
    pub fn duration(&self) -> Real {
        self.end_time - self.start_time
    }
}

/// Mean gaze position of all records sharing one world frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedSample {
    pub frame_index: u64,
    pub x: Real,
    pub y: Real,
}

/// The frame range during which one calibration marker is visible.
///
/// Intervals are produced strictly in marker order with
/// `start_frame < end_frame`, at most one per marker per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationInterval {
    /// Index into the marker table.
    pub point_index: usize,
    pub start_frame: u64,
    pub end_frame: u64,
}

/// Signed gaze error against an expected marker position.
///
/// Positive `x_error` means the measured point lies right of the target,
/// positive `y_error` means above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorSample {
    pub x_error: Real,
    pub y_error: Real,
}

impl ErrorSample {
    /// Combined error magnitude `|x| + |y|`.
    pub fn combined(&self) -> Real {
        self.x_error.abs() + self.y_error.abs()
    }
}

/// Raw error series of one marker in one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkerErrors {
    pub x_error: Vec<Real>,
    pub y_error: Vec<Real>,
    pub combined_error: Vec<Real>,
    /// Indices into the series flagged by the outlier detector.
    pub outlier_indices: Vec<usize>,
}

impl MarkerErrors {
    pub fn len(&self) -> usize {
        self.x_error.len()
    }

    /// Check that the error series are aligned.
    ///
    /// Series built by the pipeline always are; deserialized artifacts may
    /// not be.
    pub fn validate(&self) -> Result<(), crate::error::DataShapeError> {
        if self.x_error.len() != self.y_error.len() {
            return Err(crate::error::DataShapeError::LengthMismatch {
                x: self.x_error.len(),
                y: self.y_error.len(),
            });
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.x_error.is_empty()
    }

    /// Error samples with the outlier indices removed.
    pub fn inliers(&self) -> Vec<ErrorSample> {
        self.x_error
            .iter()
            .zip(self.y_error.iter())
            .enumerate()
            .filter(|(i, _)| !self.outlier_indices.contains(i))
            .map(|(_, (&x, &y))| ErrorSample {
                x_error: x,
                y_error: y,
            })
            .collect()
    }
}

/// Error of one fixation against its enclosing calibration interval.
///
/// The originating interval bounds are retained for visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationError {
    pub start_frame: u64,
    /// End frame, clipped to the enclosing interval.
    pub end_frame: u64,
    pub x_error: Real,
    pub y_error: Real,
    pub interval_start: u64,
    pub interval_end: u64,
}

/// Robust mean error of one marker in one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanError {
    pub x: Real,
    pub y: Real,
}

/// Per-marker session summary consumed by the drift fit.
///
/// `None` means no data survived outlier and cluster filtering; it is
/// serialized as JSON `null` and must never be coerced to a numeric default.
pub type SessionAverage = Option<MeanError>;
