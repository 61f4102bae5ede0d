//! Per-marker drift fitting and the coordinate correction transform.
//!
//! Tracker slippage shows up as a slow linear trend of the per-marker mean
//! error over session time. Each outer marker gets one line fit per axis;
//! at query time the predicted errors displace the canonical marker
//! positions and the homography mapping the displaced positions back onto
//! the canonical ones corrects arbitrary gaze coordinates.

use gazecal_core::{DataShapeError, MarkerTable, Pt2, Real, SessionAverage};
use gazecal_linear::{
    apply_homography, fit_homography, fit_line, HomographyError, LineFit, LineFitError,
};
use thiserror::Error;
use tracing::warn;

/// Anchoring a homography needs four point correspondences.
const MIN_ANCHORS: usize = 4;
/// A line fit needs two samples.
const MIN_SESSIONS: usize = 2;

#[derive(Debug, Error)]
pub enum DriftError {
    #[error("{times} session times vs {averages} session averages")]
    SessionCountMismatch { times: usize, averages: usize },
    #[error("only {fitted} markers could be fitted, correction needs at least 4")]
    TooFewAnchors { fitted: usize },
    #[error(transparent)]
    LineFit(#[from] LineFitError),
    #[error(transparent)]
    Homography(#[from] HomographyError),
}

/// Drift trend of one outer marker.
#[derive(Debug, Clone)]
pub struct MarkerDrift {
    pub marker_index: usize,
    pub x: LineFit,
    pub y: LineFit,
}

/// Fitted drift trends for one subject; immutable after construction.
#[derive(Debug, Clone)]
pub struct DriftModel {
    markers: MarkerTable,
    fits: Vec<MarkerDrift>,
    /// Outer markers excluded for lack of valid session averages.
    skipped: Vec<usize>,
}

/// Fit per-axis drift lines for every outer marker.
///
/// `averages_per_session` is chronological and aligned with
/// `session_times`; sessions where a marker has no average are excluded
/// from that marker's regression sample. A marker with fewer than two valid
/// sessions cannot be fitted and is skipped with a warning; the fit fails
/// only when fewer than four anchors remain.
pub fn fit_drift_model(
    markers: &MarkerTable,
    session_times: &[Real],
    averages_per_session: &[Vec<SessionAverage>],
) -> Result<DriftModel, DriftError> {
    if session_times.len() != averages_per_session.len() {
        return Err(DriftError::SessionCountMismatch {
            times: session_times.len(),
            averages: averages_per_session.len(),
        });
    }

    let mut fits = Vec::new();
    let mut skipped = Vec::new();

    for index in markers.outer_indices() {
        let mut times = Vec::new();
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (&time, averages) in session_times.iter().zip(averages_per_session.iter()) {
            if let Some(Some(mean)) = averages.get(index) {
                times.push(time);
                xs.push(mean.x);
                ys.push(mean.y);
            }
        }

        if times.len() < MIN_SESSIONS {
            let err = DataShapeError::InsufficientSessions {
                marker: markers.name(index).unwrap_or("?").to_string(),
                have: times.len(),
                need: MIN_SESSIONS,
            };
            warn!(error = %err, "marker skipped");
            skipped.push(index);
            continue;
        }

        fits.push(MarkerDrift {
            marker_index: index,
            x: fit_line(&times, &xs)?,
            y: fit_line(&times, &ys)?,
        });
    }

    if fits.len() < MIN_ANCHORS {
        return Err(DriftError::TooFewAnchors { fitted: fits.len() });
    }

    Ok(DriftModel {
        markers: markers.clone(),
        fits,
        skipped,
    })
}

impl DriftModel {
    pub fn fits(&self) -> &[MarkerDrift] {
        &self.fits
    }

    pub fn skipped_markers(&self) -> &[usize] {
        &self.skipped
    }

    /// Predicted error of one fitted marker at the given session time.
    pub fn predicted_error(&self, marker_index: usize, time: Real) -> Option<(Real, Real)> {
        self.fits
            .iter()
            .find(|f| f.marker_index == marker_index)
            .map(|f| (f.x.eval(time), f.y.eval(time)))
    }

    /// Correction transform for gaze captured around the given time.
    ///
    /// The drift-displaced positions of all fitted markers are mapped back
    /// onto their canonical positions with a least-squares homography, so
    /// any number of anchors from four upward contributes.
    pub fn correction_at(&self, time: Real) -> Result<CorrectionTransform, DriftError> {
        let mut displaced = Vec::with_capacity(self.fits.len());
        let mut canonical = Vec::with_capacity(self.fits.len());

        for fit in &self.fits {
            // Fits are built from the owned table, so the lookup holds.
            if let Some(marker) = self.markers.get(fit.marker_index) {
                displaced.push(Pt2::new(
                    marker.x + fit.x.eval(time),
                    marker.y + fit.y.eval(time),
                ));
                canonical.push(marker.position());
            }
        }

        let h = fit_homography(&displaced, &canonical)?;
        Ok(CorrectionTransform { h })
    }
}

/// A planar transform taking measured gaze to drift-corrected gaze.
#[derive(Debug, Clone)]
pub struct CorrectionTransform {
    h: gazecal_core::Mat3,
}

impl CorrectionTransform {
    /// The do-nothing transform.
    pub fn identity() -> Self {
        Self {
            h: gazecal_core::Mat3::identity(),
        }
    }

    pub fn apply(&self, x: Real, y: Real) -> (Real, Real) {
        let p = apply_homography(&self.h, &Pt2::new(x, y));
        (p.x, p.y)
    }

    pub fn matrix(&self) -> &gazecal_core::Mat3 {
        &self.h
    }
}
