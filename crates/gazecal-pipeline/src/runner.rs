//! Per-subject orchestration and the batch runner.
//!
//! One subject is the unit of work: its sessions run sequentially because
//! each stage feeds the next, while subjects are independent and fan out
//! onto worker threads with no shared mutable state. A failing marker,
//! session or subject is recorded into the failure manifest and skipped so
//! a fleet-wide run always completes with partial results.

use std::collections::BTreeMap;
use std::thread;

use gazecal_core::{
    AnalysisConfig, CalibrationInterval, DegenerateError, MarkerTable, PreconditionError, Real,
    SessionAverage, SessionRecords,
};
use gazecal_signal::{compress_frames, detect_intervals, filter_gaps, BrightnessTable};
use gazecal_stats::detector_for;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::artifacts::{SessionErrorArtifact, SubjectAveragesArtifact, SubjectErrorArtifact};
use crate::drift::{fit_drift_model, CorrectionTransform, DriftError, DriftModel};
use crate::gaze_error::{compute_session_errors, session_averages, SessionErrorReport};
use crate::statistics::{subject_statistics, MarkerStatistics};
use crate::timeline::{Timeline, TimelineSegment};

/// Input bundle for one calibration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInput {
    pub name: String,
    pub records: SessionRecords,
    /// Precomputed rectified brightness, from the per-run cache.
    pub brightness: BrightnessTable,
}

/// Everything needed to analyze one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectInput {
    pub subject: String,
    /// Normal video segments in showing order.
    pub videos: Vec<TimelineSegment>,
    /// Calibration sessions in chronological order.
    pub sessions: Vec<SessionInput>,
}

/// Failure classification for the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Precondition,
    DataShape,
    NumericDegenerate,
    Internal,
}

/// One recorded, skipped failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    pub subject: String,
    /// `None` for subject-level failures.
    pub session: Option<String>,
    pub kind: FailureKind,
    pub reason: String,
}

/// Analysis output of one session.
#[derive(Debug, Clone)]
pub struct SessionOutput {
    pub intervals: Vec<CalibrationInterval>,
    pub errors: SessionErrorReport,
    pub averages: Vec<SessionAverage>,
}

/// Complete analysis of one subject, plus everything that went wrong.
#[derive(Debug)]
pub struct SubjectReport {
    pub subject: String,
    pub timeline: Timeline,
    pub sessions: BTreeMap<String, SessionOutput>,
    /// Chronological `(session, timeline start)` of sessions that produced
    /// averages.
    pub session_times: Vec<(String, Real)>,
    pub drift: Option<DriftModel>,
    pub statistics: BTreeMap<String, MarkerStatistics>,
    pub failures: Vec<FailureRecord>,
}

#[derive(Debug, Error)]
pub enum CorrectionLookupError {
    #[error("subject has no drift model")]
    NoDriftModel,
    #[error("segment {0} is not on the timeline")]
    UnknownSegment(String),
    #[error(transparent)]
    Drift(#[from] DriftError),
}

impl SubjectReport {
    /// A report carrying nothing but a subject-level failure.
    fn failed(subject: String, kind: FailureKind, reason: String) -> Self {
        let failure = FailureRecord {
            subject: subject.clone(),
            session: None,
            kind,
            reason,
        };
        Self {
            subject,
            timeline: Timeline::default(),
            sessions: BTreeMap::new(),
            session_times: Vec::new(),
            drift: None,
            statistics: BTreeMap::new(),
            failures: vec![failure],
        }
    }

    /// Correction transform for the midpoint of a named timeline segment.
    pub fn correction_for_segment(
        &self,
        name: &str,
    ) -> Result<CorrectionTransform, CorrectionLookupError> {
        let drift = self
            .drift
            .as_ref()
            .ok_or(CorrectionLookupError::NoDriftModel)?;
        let time = self
            .timeline
            .midpoint(name)
            .ok_or_else(|| CorrectionLookupError::UnknownSegment(name.to_string()))?;
        Ok(drift.correction_at(time)?)
    }

    /// Raw error results keyed by session and marker name.
    pub fn error_artifact(&self, markers: &MarkerTable) -> SubjectErrorArtifact {
        let mut artifact = SubjectErrorArtifact::default();
        for (name, output) in &self.sessions {
            let mut session = SessionErrorArtifact::default();
            for (index, errors) in output.errors.markers.iter().enumerate() {
                if let Some(marker) = markers.name(index) {
                    session.gaze_error.insert(marker.to_string(), errors.clone());
                }
            }
            for (index, fixations) in output.errors.fixations.iter().enumerate() {
                if let Some(marker) = markers.name(index) {
                    session
                        .fixation_error
                        .insert(marker.to_string(), fixations.clone());
                }
            }
            artifact.sessions.insert(name.clone(), session);
        }
        artifact
    }

    /// Session averages keyed by session and marker name.
    pub fn averages_artifact(&self, markers: &MarkerTable) -> SubjectAveragesArtifact {
        let mut artifact = SubjectAveragesArtifact::default();
        for (name, output) in &self.sessions {
            let mut row = BTreeMap::new();
            for (index, average) in output.averages.iter().enumerate() {
                if let Some(marker) = markers.name(index) {
                    row.insert(marker.to_string(), *average);
                }
            }
            artifact.sessions.insert(name.clone(), row);
        }
        artifact
    }
}

fn process_session(
    session: &SessionInput,
    cfg: &AnalysisConfig,
) -> Result<SessionOutput, (FailureKind, String)> {
    if session.records.gaze.is_empty() {
        let err = PreconditionError::MissingRecords {
            session: session.name.clone(),
        };
        return Err((FailureKind::Precondition, err.to_string()));
    }
    if session.brightness.is_empty() {
        let err = PreconditionError::MissingBrightness {
            session: session.name.clone(),
        };
        return Err((FailureKind::Precondition, err.to_string()));
    }

    let mut brightness = session.brightness.clone();
    let intervals = detect_intervals(&mut brightness, cfg.markers.len(), &cfg.intervals)
        .map_err(|e| (FailureKind::DataShape, e.to_string()))?;

    let filtered = filter_gaps(
        &session.records.gaze,
        cfg.intervals.starting_frame,
        &cfg.gaps,
    );
    let compressed = compress_frames(&filtered.retained)
        .map_err(|e| (FailureKind::DataShape, e.to_string()))?;

    let detector = detector_for(&cfg.outliers);
    let errors = compute_session_errors(
        &compressed,
        &intervals,
        &session.records.fixations,
        &cfg.markers,
        detector.as_ref(),
    );
    let averages = session_averages(&errors, &cfg.cluster);

    Ok(SessionOutput {
        intervals,
        errors,
        averages,
    })
}

/// Run the full analysis for one subject.
///
/// Never fails: anything that goes wrong lands in the report's failure
/// manifest and the remaining work continues.
pub fn analyze_subject(input: &SubjectInput, cfg: &AnalysisConfig) -> SubjectReport {
    info!(
        subject = %input.subject,
        sessions = input.sessions.len(),
        "analyzing subject"
    );

    let session_names: Vec<String> = input.sessions.iter().map(|s| s.name.clone()).collect();
    let timeline = Timeline::interleave(&input.videos, &session_names, &cfg.timeline);

    let mut sessions = BTreeMap::new();
    let mut failures = Vec::new();
    let mut session_times = Vec::new();
    let mut average_rows = Vec::new();

    for session in &input.sessions {
        match process_session(session, cfg) {
            Ok(output) => {
                // Markers that survived nothing stay `None`; record them so
                // the manifest explains the hole in the averages.
                for (index, average) in output.averages.iter().enumerate() {
                    if average.is_none() {
                        let err = DegenerateError::NoSurvivingData {
                            marker: cfg.markers.name(index).unwrap_or("?").to_string(),
                        };
                        failures.push(FailureRecord {
                            subject: input.subject.clone(),
                            session: Some(session.name.clone()),
                            kind: FailureKind::NumericDegenerate,
                            reason: err.to_string(),
                        });
                    }
                }
                match timeline.start_time(&session.name) {
                    Some(time) => {
                        session_times.push((session.name.clone(), time));
                        average_rows.push(output.averages.clone());
                    }
                    None => failures.push(FailureRecord {
                        subject: input.subject.clone(),
                        session: Some(session.name.clone()),
                        kind: FailureKind::Precondition,
                        reason: "session has no slot on the timeline".into(),
                    }),
                }
                sessions.insert(session.name.clone(), output);
            }
            Err((kind, reason)) => {
                warn!(
                    subject = %input.subject,
                    session = %session.name,
                    %reason,
                    "session skipped"
                );
                failures.push(FailureRecord {
                    subject: input.subject.clone(),
                    session: Some(session.name.clone()),
                    kind,
                    reason,
                });
            }
        }
    }

    let times: Vec<Real> = session_times.iter().map(|(_, t)| *t).collect();
    let drift = match fit_drift_model(&cfg.markers, &times, &average_rows) {
        Ok(model) => Some(model),
        Err(err) => {
            warn!(subject = %input.subject, error = %err, "drift fit failed");
            let kind = match err {
                DriftError::Homography(_) => FailureKind::NumericDegenerate,
                _ => FailureKind::DataShape,
            };
            failures.push(FailureRecord {
                subject: input.subject.clone(),
                session: None,
                kind,
                reason: err.to_string(),
            });
            None
        }
    };

    let statistics = subject_statistics(&cfg.markers, &times, &average_rows);

    SubjectReport {
        subject: input.subject.clone(),
        timeline,
        sessions,
        session_times,
        drift,
        statistics,
        failures,
    }
}

/// Analysis results for a whole batch of subjects.
#[derive(Debug)]
pub struct BatchReport {
    pub subjects: Vec<SubjectReport>,
}

impl BatchReport {
    /// Every failure recorded across the batch.
    pub fn failures(&self) -> Vec<&FailureRecord> {
        self.subjects.iter().flat_map(|s| s.failures.iter()).collect()
    }
}

/// Analyze all subjects, one worker thread per subject.
///
/// A panicking worker is recorded as a subject-level failure; the batch
/// itself always completes.
pub fn run_batch(inputs: &[SubjectInput], cfg: &AnalysisConfig) -> BatchReport {
    let joined: Vec<thread::Result<SubjectReport>> = thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| scope.spawn(move || analyze_subject(input, cfg)))
            .collect();
        handles.into_iter().map(|h| h.join()).collect()
    });

    let subjects = inputs
        .iter()
        .zip(joined)
        .map(|(input, result)| match result {
            Ok(report) => report,
            Err(_) => SubjectReport::failed(
                input.subject.clone(),
                FailureKind::Internal,
                "subject worker panicked".into(),
            ),
        })
        .collect();

    BatchReport { subjects }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazecal_core::{GazeRecord, MarkerTable};
    use gazecal_signal::brightness::FrameBrightness;

    /// Brightness table with one sequential dip per marker.
    ///
    /// Marker `m` is dark during frames `[20 + m * 30, 20 + m * 30 + 15)`.
    pub(crate) fn synthetic_brightness(marker_count: usize, frame_count: u64) -> BrightnessTable {
        let frames = (0..frame_count)
            .map(|frame| {
                let dark = (0..marker_count).any(|m| {
                    let start = 20 + m as u64 * 30;
                    frame >= start && frame < start + 15
                });
                let level = if dark { 100.0 } else { 200.0 };
                FrameBrightness {
                    roi_minimum: vec![level; marker_count],
                    roi_average: vec![level; marker_count],
                    surface_average: level,
                }
            })
            .collect();
        BrightnessTable::new(frames)
    }

    /// 240 Hz gaze records tracking each visible marker with a fixed offset.
    pub(crate) fn synthetic_gaze(
        markers: &MarkerTable,
        frame_count: u64,
        offset: (Real, Real),
    ) -> Vec<GazeRecord> {
        let mut records = Vec::new();
        for i in 0..frame_count * 8 {
            let frame_index = i / 8;
            let visible = (0..markers.len()).find(|&m| {
                let start = 20 + m as u64 * 30;
                frame_index >= start && frame_index < start + 15
            });
            let (x, y) = match visible.and_then(|m| markers.get(m)) {
                Some(marker) => (marker.x + offset.0, marker.y + offset.1),
                None => (0.5, 0.5),
            };
            records.push(GazeRecord {
                frame_index,
                timestamp: i as Real / 240.0,
                x,
                y,
            });
        }
        records
    }

    pub(crate) fn synthetic_subject(name: &str, session_count: usize) -> SubjectInput {
        let markers = MarkerTable::reference_five();
        let sessions = (0..session_count)
            .map(|s| SessionInput {
                name: format!("{:03}", s + 1),
                records: SessionRecords {
                    gaze: synthetic_gaze(&markers, 200, (0.01, 0.02)),
                    fixations: Vec::new(),
                },
                brightness: synthetic_brightness(markers.len(), 200),
            })
            .collect();
        let videos = (0..session_count * 4)
            .map(|i| TimelineSegment {
                name: format!("video_{i}"),
                length_seconds: 30.0,
            })
            .collect();
        SubjectInput {
            subject: name.to_string(),
            videos,
            sessions,
        }
    }

    #[test]
    fn synthetic_subject_produces_full_report() {
        let cfg = AnalysisConfig::default();
        let input = synthetic_subject("s01", 2);
        let report = analyze_subject(&input, &cfg);

        assert!(report.failures.is_empty(), "failures: {:?}", report.failures);
        assert_eq!(report.sessions.len(), 2);
        assert_eq!(report.session_times.len(), 2);

        let session = &report.sessions["001"];
        assert_eq!(session.intervals.len(), 5);
        for average in session.averages.iter() {
            let mean = average.expect("every marker tracked");
            assert!((mean.x - 0.01).abs() < 1e-9);
            assert!((mean.y - 0.02).abs() < 1e-9);
        }

        let drift = report.drift.as_ref().expect("drift model fitted");
        assert_eq!(drift.fits().len(), 4);
    }

    #[test]
    fn empty_session_is_recorded_and_skipped() {
        let cfg = AnalysisConfig::default();
        let mut input = synthetic_subject("s02", 2);
        input.sessions[1].records.gaze.clear();

        let report = analyze_subject(&input, &cfg);
        assert_eq!(report.sessions.len(), 1);
        assert!(report
            .failures
            .iter()
            .any(|f| f.session.as_deref() == Some("002")
                && f.kind == FailureKind::Precondition));
        // One valid session cannot anchor a drift fit.
        assert!(report.drift.is_none());
        assert!(report
            .failures
            .iter()
            .any(|f| f.session.is_none() && f.kind == FailureKind::DataShape));
    }

    #[test]
    fn correction_for_segment_uses_midpoint() {
        let cfg = AnalysisConfig::default();
        let input = synthetic_subject("s03", 2);
        let report = analyze_subject(&input, &cfg);

        let correction = report.correction_for_segment("video_1").unwrap();
        // The synthetic offset is constant, so the correction moves a
        // displaced marker back onto its canonical position.
        let marker = cfg.markers.get(1).unwrap();
        let (cx, cy) = correction.apply(marker.x + 0.01, marker.y + 0.02);
        assert!((cx - marker.x).abs() < 1e-6);
        assert!((cy - marker.y).abs() < 1e-6);

        assert!(matches!(
            report.correction_for_segment("nope"),
            Err(CorrectionLookupError::UnknownSegment(_))
        ));
    }

    #[test]
    fn batch_completes_with_partial_results() {
        let cfg = AnalysisConfig::default();
        let mut bad = synthetic_subject("bad", 2);
        for session in &mut bad.sessions {
            session.brightness = BrightnessTable::default();
        }
        let inputs = vec![synthetic_subject("good", 2), bad];

        let report = run_batch(&inputs, &cfg);
        assert_eq!(report.subjects.len(), 2);
        assert!(report.subjects[0].failures.is_empty());
        assert!(!report.subjects[1].failures.is_empty());
        assert!(!report.failures().is_empty());
    }

    #[test]
    fn artifacts_are_keyed_by_marker_name() {
        let cfg = AnalysisConfig::default();
        let report = analyze_subject(&synthetic_subject("s04", 1), &cfg);

        let errors = report.error_artifact(&cfg.markers);
        let session = &errors.sessions["001"];
        assert!(session.gaze_error.contains_key("center"));
        assert!(session.gaze_error.contains_key("bottom_right"));

        let averages = report.averages_artifact(&cfg.markers);
        assert!(averages.sessions["001"]["top_left"].is_some());
    }
}
