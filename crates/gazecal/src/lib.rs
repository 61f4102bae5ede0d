//! High-level entry crate for the `gaze-drift-rs` toolbox.
//!
//! The crate re-exports the full analysis surface:
//!
//! - [`core`]: shared types, the marker table and the validated
//!   [`core::AnalysisConfig`],
//! - [`signal`]: gap filtering, frame compression and the calibration
//!   interval scan,
//! - [`stats`]: outlier rejection and dominant-mode clustering,
//! - [`linear`]: the homography and line-fit solvers,
//! - [`pipeline`]: per-subject orchestration, drift modeling and artifacts.
//!
//! Typical use runs whole subjects through the pipeline:
//!
//! ```no_run
//! use gazecal::core::AnalysisConfig;
//! use gazecal::pipeline::{analyze_subject, SubjectInput};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = AnalysisConfig::default();
//! cfg.validate()?;
//!
//! let input = SubjectInput {
//!     subject: "s01".into(),
//!     videos: Vec::new(),   // normal segments, in showing order
//!     sessions: Vec::new(), // calibration sessions with brightness data
//! };
//! let report = analyze_subject(&input, &cfg);
//!
//! for failure in &report.failures {
//!     eprintln!("skipped: {}", failure.reason);
//! }
//! if let Some(drift) = &report.drift {
//!     let correction = drift.correction_at(120.0)?;
//!     let (x, y) = correction.apply(0.4, 0.6);
//!     println!("corrected: {x} {y}");
//! }
//! # Ok(())
//! # }
//! ```

pub use gazecal_core as core;
pub use gazecal_linear as linear;
pub use gazecal_pipeline as pipeline;
pub use gazecal_signal as signal;
pub use gazecal_stats as stats;

pub use gazecal_core::{AnalysisConfig, MarkerTable};
pub use gazecal_pipeline::{analyze_subject, run_batch, BatchReport, SubjectInput, SubjectReport};
