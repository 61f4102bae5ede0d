//! Marker visibility scan over a calibration video.
//!
//! Markers are shown one at a time in table order, each fading in and out.
//! The scan watches the ROI minimum brightness of the marker it currently
//! expects: a drop below the visibility threshold opens an interval, a rise
//! above the fade threshold closes it and moves on to the next marker.
//! There is no re-detection and no skipping.

use gazecal_core::{CalibrationInterval, IntervalConfig};
use thiserror::Error;
use tracing::debug;

use crate::brightness::BrightnessSource;

#[derive(Debug, Error)]
pub enum IntervalError {
    #[error("cannot scan for zero markers")]
    NoMarkers,
}

/// Scan state: either waiting for the current marker to appear, or watching
/// a visible marker for its fade-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Visible { since: u64 },
}

/// Detect the visibility interval of each marker in a calibration video.
///
/// Frames at or before `cfg.starting_frame` are ignored so leading blank
/// frames cannot trigger a false fade-in. If the stream ends while a marker
/// is still visible, its interval is closed at the final frame.
pub fn detect_intervals(
    source: &mut dyn BrightnessSource,
    marker_count: usize,
    cfg: &IntervalConfig,
) -> Result<Vec<CalibrationInterval>, IntervalError> {
    if marker_count == 0 {
        return Err(IntervalError::NoMarkers);
    }

    let mut intervals = Vec::with_capacity(marker_count);
    let mut state = ScanState::Idle;
    let mut current = 0usize;
    let mut frame = 0u64;
    let mut last_frame = None;

    loop {
        let Some(minimum) = source.roi_minimum(frame, current) else {
            break;
        };
        last_frame = Some(frame);

        if frame > cfg.starting_frame {
            state = match state {
                ScanState::Idle if minimum < cfg.visible_threshold => {
                    debug!(marker = current, frame, "marker fade-in");
                    ScanState::Visible { since: frame }
                }
                ScanState::Visible { since } if minimum > cfg.fade_threshold => {
                    debug!(marker = current, frame, "marker fade-out");
                    intervals.push(CalibrationInterval {
                        point_index: current,
                        start_frame: since,
                        end_frame: frame,
                    });
                    if current + 1 == marker_count {
                        return Ok(intervals);
                    }
                    current += 1;
                    ScanState::Idle
                }
                other => other,
            };
        }

        frame += 1;
    }

    // The video may end before the last marker fades out; close its
    // interval at the final frame.
    if let (ScanState::Visible { since }, Some(last)) = (state, last_frame) {
        if last > since {
            debug!(marker = current, frame = last, "stream ended while visible");
            intervals.push(CalibrationInterval {
                point_index: current,
                start_frame: since,
                end_frame: last,
            });
        }
    }

    Ok(intervals)
}
