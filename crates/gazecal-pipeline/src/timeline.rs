//! Session timeline assembly.
//!
//! The experiment log records only the normal video segments; calibration
//! checks run at a fixed cadence between them and do not show up in the log.
//! The timeline interleaves both so every segment, calibration checks
//! included, gets an elapsed-time coordinate.

use gazecal_core::{Real, TimelineConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One named segment of the test session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub name: String,
    pub length_seconds: Real,
}

/// Ordered segments of one subject's full session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    segments: Vec<TimelineSegment>,
}

impl Timeline {
    /// Interleave calibration checks into the ordered normal segments.
    ///
    /// After every `cfg.checks_every` normal segments the next calibration
    /// check is inserted with the configured length. Checks left over when
    /// the videos run out are dropped with a warning.
    pub fn interleave(videos: &[TimelineSegment], checks: &[String], cfg: &TimelineConfig) -> Self {
        let mut segments = Vec::with_capacity(videos.len() + checks.len());
        let mut checks_iter = checks.iter();
        let mut since_check = 0usize;

        for video in videos {
            segments.push(video.clone());
            since_check += 1;
            if since_check == cfg.checks_every {
                since_check = 0;
                if let Some(check) = checks_iter.next() {
                    segments.push(TimelineSegment {
                        name: check.clone(),
                        length_seconds: cfg.check_length_seconds,
                    });
                }
            }
        }

        let unplaced = checks_iter.count();
        if unplaced > 0 {
            warn!(unplaced, "calibration checks beyond the end of the video order");
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[TimelineSegment] {
        &self.segments
    }

    /// Elapsed seconds at which the named segment starts.
    pub fn start_time(&self, name: &str) -> Option<Real> {
        let mut elapsed = 0.0;
        for segment in &self.segments {
            if segment.name == name {
                return Some(elapsed);
            }
            elapsed += segment.length_seconds;
        }
        None
    }

    /// Elapsed seconds at which the named segment ends.
    pub fn end_time(&self, name: &str) -> Option<Real> {
        self.start_time(name).map(|start| {
            start
                + self
                    .segments
                    .iter()
                    .find(|s| s.name == name)
                    .map(|s| s.length_seconds)
                    .unwrap_or(0.0)
        })
    }

    /// Elapsed seconds at the middle of the named segment.
    pub fn midpoint(&self, name: &str) -> Option<Real> {
        match (self.start_time(name), self.end_time(name)) {
            (Some(start), Some(end)) => Some((start + end) / 2.0),
            _ => None,
        }
    }
}
