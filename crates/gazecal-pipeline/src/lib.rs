//! Session analysis pipeline for `gaze-drift-rs`.
//!
//! This crate wires the stream, detection and statistics stages into the
//! per-subject analysis flow:
//!
//! ```text
//! gaze records -> gap filter -> frame compressor ---+
//! brightness   -> interval detector ----------------+--> error aggregation
//!                                                        |
//!                                   session averages <---+
//!                                        |
//!                timeline -> drift model -> correction transform
//! ```
//!
//! The [`runner`] module owns the per-subject error boundary: a failing
//! marker, session or subject is recorded into a failure manifest and
//! skipped, never aborting sibling work.

/// JSON artifacts and atomic persistence.
pub mod artifacts;
/// Per-marker drift fitting and the coordinate correction transform.
pub mod drift;
/// Per-frame corrected gaze export for normal video segments.
pub mod frame_map;
/// Per-interval gaze and fixation error computation.
pub mod gaze_error;
/// Per-subject orchestration and the batch runner.
pub mod runner;
/// Per-marker summary statistics across sessions.
pub mod statistics;
/// Session timeline assembly and segment timing.
pub mod timeline;

pub use artifacts::{read_json, write_json_atomic, ArtifactError};
pub use drift::{fit_drift_model, CorrectionTransform, DriftError, DriftModel};
pub use frame_map::{map_gaze_to_frames, FrameMapConfig, FrameMapError};
pub use gaze_error::{compute_session_errors, session_averages, SessionErrorReport};
pub use runner::{analyze_subject, run_batch, BatchReport, FailureRecord, SubjectInput, SubjectReport};
pub use statistics::{subject_statistics, MarkerStatistics};
pub use timeline::{Timeline, TimelineSegment};
