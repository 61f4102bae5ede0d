//! Rectified-surface brightness sampling.
//!
//! Video decoding and homography rectification happen upstream; the core
//! only ever sees brightness statistics of the rectified surface. The
//! [`BrightnessSource`] trait is that boundary: per frame, the minimum or
//! average brightness inside a marker's region of interest, or the average
//! over the whole surface. [`BrightnessTable`] is the persisted form of the
//! same data, used both as the per-run cache and as test input.

use gazecal_core::Real;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-frame brightness statistics of the rectified calibration surface.
///
/// All methods return `None` once the frame index runs past the end of the
/// underlying stream.
pub trait BrightnessSource {
    /// Minimum brightness inside the ROI of the given marker.
    fn roi_minimum(&mut self, frame: u64, marker: usize) -> Option<Real>;
    /// Average brightness inside the ROI of the given marker.
    fn roi_average(&mut self, frame: u64, marker: usize) -> Option<Real>;
    /// Average brightness over the whole surface.
    fn surface_average(&mut self, frame: u64) -> Option<Real>;
}

/// Brightness statistics of one rectified frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameBrightness {
    /// Per-marker ROI minima, indexed like the marker table.
    pub roi_minimum: Vec<Real>,
    /// Per-marker ROI averages.
    pub roi_average: Vec<Real>,
    /// Whole-surface average.
    pub surface_average: Real,
}

/// Precomputed brightness statistics for a whole session.
///
/// Produced by the rectification collaborator, persisted as the per-run
/// cache artifact and replayed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrightnessTable {
    pub frames: Vec<FrameBrightness>,
}

impl BrightnessTable {
    pub fn new(frames: Vec<FrameBrightness>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl BrightnessSource for BrightnessTable {
    fn roi_minimum(&mut self, frame: u64, marker: usize) -> Option<Real> {
        self.frames
            .get(frame as usize)
            .and_then(|f| f.roi_minimum.get(marker))
            .copied()
    }

    fn roi_average(&mut self, frame: u64, marker: usize) -> Option<Real> {
        self.frames
            .get(frame as usize)
            .and_then(|f| f.roi_average.get(marker))
            .copied()
    }

    fn surface_average(&mut self, frame: u64) -> Option<Real> {
        self.frames.get(frame as usize).map(|f| f.surface_average)
    }
}

/// Index of the first frame that is not blank.
///
/// Sessions start with black frames before the stimulus appears; the first
/// frame whose whole-surface average exceeds `darkness_threshold` marks the
/// real beginning. Returns `None` when every frame stays dark.
pub fn find_starting_frame(
    source: &mut dyn BrightnessSource,
    darkness_threshold: Real,
) -> Option<u64> {
    let mut frame = 0u64;
    loop {
        let average = source.surface_average(frame)?;
        if average > darkness_threshold {
            debug!(frame, average, "leading blank frames end");
            return Some(frame);
        }
        frame += 1;
    }
}

/// Minimum ROI average brightness per marker over the whole session.
///
/// A marker that actually appears pulls its ROI average far below the idle
/// surface level; the per-marker minima are used to calibrate the
/// visibility thresholds. Markers never sampled stay at the 8-bit ceiling.
pub fn survey_marker_brightness(
    source: &mut dyn BrightnessSource,
    marker_count: usize,
) -> Vec<Real> {
    let mut minima = vec![255.0; marker_count];
    let mut frame = 0u64;
    'frames: loop {
        for (marker, minimum) in minima.iter_mut().enumerate() {
            match source.roi_average(frame, marker) {
                Some(average) if average < *minimum => *minimum = average,
                Some(_) => {}
                None => break 'frames,
            }
        }
        frame += 1;
    }
    minima
}
