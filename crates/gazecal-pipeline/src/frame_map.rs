//! Per-frame corrected gaze export for normal video segments.
//!
//! The downstream consumer wants one gaze coordinate per video frame in
//! pixel space. Gaze records are bucketed into frame periods starting at
//! the first record on the starting frame; sparse buckets indicate a blink
//! (the capture software already removed the worst samples) and yield no
//! coordinate for that frame.

use gazecal_core::{GazeRecord, Real};
use thiserror::Error;

use crate::drift::CorrectionTransform;

#[derive(Debug, Error)]
pub enum FrameMapError {
    #[error("no gaze record on starting frame {0}")]
    StartFrameNotFound(u64),
    #[error("frame rate must be positive, got {0}")]
    BadFrameRate(Real),
}

/// Video parameters of the segment being mapped.
#[derive(Debug, Clone, Copy)]
pub struct FrameMapConfig {
    pub frame_rate: Real,
    /// Output resolution in pixels.
    pub width: u32,
    pub height: u32,
}

impl FrameMapConfig {
    /// Minimum gaze samples per frame period for the frame to count.
    ///
    /// The eye camera delivers ~240 samples per second; a period with far
    /// fewer was thinned by blink removal upstream in the capture chain.
    fn blink_threshold(&self) -> usize {
        ((240.0 / self.frame_rate) - 0.01).floor().max(0.0) as usize
    }
}

/// Map a gaze stream onto video frames, applying the drift correction.
///
/// Returns one entry per frame period: the corrected pixel coordinate, or
/// `None` when the period was too sparse or the corrected point leaves the
/// frame. The trailing partial period is dropped.
pub fn map_gaze_to_frames(
    records: &[GazeRecord],
    start_frame: u64,
    cfg: &FrameMapConfig,
    correction: &CorrectionTransform,
) -> Result<Vec<Option<(Real, Real)>>, FrameMapError> {
    if cfg.frame_rate <= 0.0 {
        return Err(FrameMapError::BadFrameRate(cfg.frame_rate));
    }

    let start = records
        .iter()
        .position(|r| r.frame_index == start_frame)
        .ok_or(FrameMapError::StartFrameNotFound(start_frame))?;

    let frametime = 1.0 / cfg.frame_rate;
    let threshold = cfg.blink_threshold();
    let mut window_start = records[start].timestamp;

    let mut frames = Vec::new();
    let mut bucket: Vec<(Real, Real)> = Vec::new();

    for record in &records[start + 1..] {
        while record.timestamp > window_start + frametime {
            frames.push(flush(&bucket, threshold, cfg, correction));
            bucket.clear();
            window_start += frametime;
        }
        bucket.push((record.x, record.y));
    }

    Ok(frames)
}

fn flush(
    bucket: &[(Real, Real)],
    threshold: usize,
    cfg: &FrameMapConfig,
    correction: &CorrectionTransform,
) -> Option<(Real, Real)> {
    if bucket.is_empty() || bucket.len() < threshold {
        return None;
    }

    let n = bucket.len() as Real;
    let avg_x = bucket.iter().map(|(x, _)| x).sum::<Real>() / n;
    let avg_y = bucket.iter().map(|(_, y)| y).sum::<Real>() / n;

    let (cx, cy) = correction.apply(avg_x, avg_y);
    let px = cx * cfg.width as Real;
    let py = cy * cfg.height as Real;

    let in_frame =
        px >= 0.0 && py >= 0.0 && px <= cfg.width as Real && py <= cfg.height as Real;
    in_frame.then_some((px, py))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(frame_rate: Real) -> FrameMapConfig {
        FrameMapConfig {
            frame_rate,
            width: 1920,
            height: 1080,
        }
    }

    /// 240 Hz gaze samples, all at the same normalized position.
    fn dense_records(seconds: Real, x: Real, y: Real) -> Vec<GazeRecord> {
        let count = (seconds * 240.0) as usize;
        (0..count)
            .map(|i| GazeRecord {
                frame_index: i as u64 / 4,
                timestamp: i as Real / 240.0,
                x,
                y,
            })
            .collect()
    }

    #[test]
    fn dense_stream_maps_every_frame() {
        let records = dense_records(1.0, 0.5, 0.5);
        let frames =
            map_gaze_to_frames(&records, 0, &cfg(60.0), &CorrectionTransform::identity()).unwrap();

        assert!(frames.len() >= 58, "got {} frames", frames.len());
        for frame in &frames {
            let (px, py) = frame.expect("dense frame should map");
            assert!((px - 960.0).abs() < 1e-9);
            assert!((py - 540.0).abs() < 1e-9);
        }
    }

    #[test]
    fn sparse_period_yields_none() {
        // One lonely sample in the second frame period.
        let mut records = dense_records(0.1, 0.5, 0.5);
        records.retain(|r| r.timestamp < 1.0 / 60.0 || r.timestamp > 2.0 / 60.0);
        // Keep a tail so the middle period is flushed.
        let frames =
            map_gaze_to_frames(&records, 0, &cfg(60.0), &CorrectionTransform::identity()).unwrap();
        assert!(frames.len() >= 2);
        assert!(frames[1].is_none());
    }

    #[test]
    fn out_of_frame_points_are_dropped() {
        let records = dense_records(0.5, 1.2, 0.5); // off screen to the right
        let frames =
            map_gaze_to_frames(&records, 0, &cfg(60.0), &CorrectionTransform::identity()).unwrap();
        assert!(!frames.is_empty());
        assert!(frames.iter().all(Option::is_none));
    }

    #[test]
    fn missing_start_frame_is_an_error() {
        let records = dense_records(0.1, 0.5, 0.5);
        assert!(matches!(
            map_gaze_to_frames(&records, 999, &cfg(60.0), &CorrectionTransform::identity()),
            Err(FrameMapError::StartFrameNotFound(999))
        ));
    }
}
