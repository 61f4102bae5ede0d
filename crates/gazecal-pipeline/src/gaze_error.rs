//! Per-interval gaze and fixation error computation.
//!
//! For every detected calibration interval, the compressed gaze samples
//! falling inside it are compared against the expected marker position.
//! Error signs follow the normalized coordinate convention: positive x means
//! the measured point lies right of the target, positive y means above it.

use gazecal_core::{
    CalibrationInterval, ClusterConfig, CompressedSample, FixationError, FixationRecord,
    MarkerErrors, MarkerTable, MeanError, Pt2, SessionAverage,
};
use gazecal_stats::{select_dominant_mode, OutlierDetector};
use tracing::warn;

/// Raw error series of one session, aligned with the marker table.
///
/// Markers without a detected interval keep empty series; they must not
/// fail here, the averaging step represents them as missing data.
#[derive(Debug, Clone, Default)]
pub struct SessionErrorReport {
    /// Per-marker gaze error series, indexed like the marker table.
    pub markers: Vec<MarkerErrors>,
    /// Per-marker fixation errors, indexed like the marker table.
    pub fixations: Vec<Vec<FixationError>>,
}

/// Compute gaze and fixation errors for every calibration interval.
pub fn compute_session_errors(
    samples: &[CompressedSample],
    intervals: &[CalibrationInterval],
    fixations: &[FixationRecord],
    markers: &MarkerTable,
    detector: &dyn OutlierDetector,
) -> SessionErrorReport {
    let mut report = SessionErrorReport {
        markers: vec![MarkerErrors::default(); markers.len()],
        fixations: vec![Vec::new(); markers.len()],
    };

    for interval in intervals {
        let Some(marker) = markers.get(interval.point_index) else {
            warn!(
                point_index = interval.point_index,
                "interval refers to an unknown marker, skipping"
            );
            continue;
        };

        let mut errors = MarkerErrors::default();
        for sample in samples
            .iter()
            .filter(|s| s.frame_index >= interval.start_frame && s.frame_index <= interval.end_frame)
        {
            let x_error = sample.x - marker.x;
            let y_error = sample.y - marker.y;
            errors.x_error.push(x_error);
            errors.y_error.push(y_error);
            errors.combined_error.push(x_error.abs() + y_error.abs());
        }

        let error_samples = errors
            .x_error
            .iter()
            .zip(errors.y_error.iter())
            .map(|(&x, &y)| gazecal_core::ErrorSample {
                x_error: x,
                y_error: y,
            })
            .collect::<Vec<_>>();
        errors.outlier_indices = detector.detect(&error_samples);

        // Fixations starting strictly inside the interval, clipped to its end.
        let mut fixation_errors = Vec::new();
        for fixation in fixations
            .iter()
            .filter(|f| f.start_frame > interval.start_frame && f.start_frame < interval.end_frame)
        {
            fixation_errors.push(FixationError {
                start_frame: fixation.start_frame,
                end_frame: fixation.end_frame.min(interval.end_frame),
                x_error: fixation.x - marker.x,
                y_error: fixation.y - marker.y,
                interval_start: interval.start_frame,
                interval_end: interval.end_frame,
            });
        }

        report.markers[interval.point_index] = errors;
        report.fixations[interval.point_index] = fixation_errors;
    }

    report
}

/// Robust per-marker mean error of one session.
///
/// Outlier indices are dropped, the survivors run through dominant-mode
/// selection, and the result is averaged. A marker with nothing left is
/// reported as `None`, never as a numeric default.
pub fn session_averages(
    report: &SessionErrorReport,
    cluster_cfg: &ClusterConfig,
) -> Vec<SessionAverage> {
    report
        .markers
        .iter()
        .map(|errors| {
            if let Err(err) = errors.validate() {
                warn!(error = %err, "marker error series unusable, no average");
                return None;
            }
            let survivors: Vec<Pt2> = errors
                .inliers()
                .iter()
                .map(|e| Pt2::new(e.x_error, e.y_error))
                .collect();
            if survivors.is_empty() {
                return None;
            }

            let selected = select_dominant_mode(&survivors, cluster_cfg);
            if selected.is_empty() {
                return None;
            }

            let n = selected.len() as f64;
            Some(MeanError {
                x: selected.iter().map(|p| p.x).sum::<f64>() / n,
                y: selected.iter().map(|p| p.y).sum::<f64>() / n,
            })
        })
        .collect()
}
