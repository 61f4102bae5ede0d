//! End-to-end determinism of the subject analysis.
//!
//! A synthetic two-session subject with deterministic inputs must produce
//! byte-identical session averages on repeated runs: the k-means seed and
//! the outlier policy leave no randomness in the pipeline.

use gazecal_core::{AnalysisConfig, GazeRecord, MarkerTable, Real, SessionRecords};
use gazecal_pipeline::{analyze_subject, read_json, write_json_atomic, SubjectInput, TimelineSegment};
use gazecal_pipeline::artifacts::SubjectAveragesArtifact;
use gazecal_pipeline::runner::SessionInput;
use gazecal_signal::brightness::{BrightnessTable, FrameBrightness};

const FRAME_COUNT: u64 = 200;

fn dip_window(marker: usize) -> (u64, u64) {
    let start = 20 + marker as u64 * 30;
    (start, start + 15)
}

fn brightness(marker_count: usize) -> BrightnessTable {
    let frames = (0..FRAME_COUNT)
        .map(|frame| {
            let dark = (0..marker_count).any(|m| {
                let (start, end) = dip_window(m);
                frame >= start && frame < end
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

/// Gaze with a per-session offset and a burst of scattered noise inside the
/// first marker interval, dispersed enough to trigger the cluster selector.
fn gaze(markers: &MarkerTable, offset: (Real, Real)) -> Vec<GazeRecord> {
    let mut records = Vec::new();
    for i in 0..FRAME_COUNT * 8 {
        let frame_index = i / 8;
        let visible = (0..markers.len()).find(|&m| {
            let (start, end) = dip_window(m);
            frame_index >= start && frame_index < end
        });
        let (mut x, mut y) = match visible.and_then(|m| markers.get(m)) {
            Some(marker) => (marker.x + offset.0, marker.y + offset.1),
            None => (0.5, 0.5),
        };
        // A secondary mode inside marker 0's window: every third frame
        // lands far from the fixation. Whole frames are displaced so the
        // per-frame compression keeps the two modes separable.
        if visible == Some(0) && (frame_index - 20) % 3 == 0 {
            x += 0.2;
            y -= 0.15;
        }
        records.push(GazeRecord {
            frame_index,
            timestamp: i as Real / 240.0,
            x,
            y,
        });
    }
    records
}

fn subject(name: &str) -> SubjectInput {
    let markers = MarkerTable::reference_five();
    let sessions = (0..2)
        .map(|s| SessionInput {
            name: format!("{:03}", s + 1),
            records: SessionRecords {
                gaze: gaze(&markers, (0.01 + 0.005 * s as Real, 0.02)),
                fixations: Vec::new(),
            },
            brightness: brightness(markers.len()),
        })
        .collect();
    let videos = (0..8)
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
fn repeated_runs_are_byte_identical() {
    let cfg = AnalysisConfig::default();

    let first = analyze_subject(&subject("subj"), &cfg);
    let second = analyze_subject(&subject("subj"), &cfg);

    let artifact_a = first.averages_artifact(&cfg.markers);
    let artifact_b = second.averages_artifact(&cfg.markers);

    let json_a = serde_json::to_string_pretty(&artifact_a).unwrap();
    let json_b = serde_json::to_string_pretty(&artifact_b).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn averages_survive_noise_and_track_the_offset() {
    let cfg = AnalysisConfig::default();
    let report = analyze_subject(&subject("subj"), &cfg);

    assert!(report.failures.is_empty(), "failures: {:?}", report.failures);
    for (name, output) in &report.sessions {
        let session_index: usize = name.trim_start_matches('0').parse().unwrap();
        let expected_x = 0.01 + 0.005 * (session_index - 1) as Real;
        // Outer markers are clean; their averages match the offset.
        for index in 1..5 {
            let mean = output.averages[index].expect("outer marker average");
            assert!(
                (mean.x - expected_x).abs() < 1e-9,
                "{name} marker {index}: {} vs {expected_x}",
                mean.x
            );
            assert!((mean.y - 0.02).abs() < 1e-9);
        }
        // Marker 0 carried a secondary mode; the dominant mode wins, so the
        // average stays near the true offset instead of drifting toward it.
        let center = output.averages[0].expect("center average");
        assert!(
            (center.x - expected_x).abs() < 0.01,
            "center x {} vs {expected_x}",
            center.x
        );
    }

    let drift = report.drift.as_ref().expect("drift model");
    assert_eq!(drift.fits().len(), 4);
}

#[test]
fn artifacts_roundtrip_through_disk() {
    let cfg = AnalysisConfig::default();
    let report = analyze_subject(&subject("subj"), &cfg);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session_averages.json");
    write_json_atomic(&path, &report.averages_artifact(&cfg.markers)).unwrap();

    let back: SubjectAveragesArtifact = read_json(&path).unwrap();
    assert_eq!(back.sessions.len(), 2);
    assert!(back.sessions["001"]["center"].is_some());
}
