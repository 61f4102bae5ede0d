//! Per-marker summary statistics across a subject's sessions.
//!
//! The session averages feed a compact statistical digest per marker:
//! the error series itself, its spread, and the same line fits the drift
//! model uses. Exported as the statistics artifact.

use std::collections::BTreeMap;

use gazecal_core::{std_dev, variance, MarkerTable, Real, SessionAverage};
use gazecal_linear::{fit_line, LineFit};
use serde::{Deserialize, Serialize};

/// Statistical digest of one marker across all sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStatistics {
    /// Session-average x errors, sessions with no data omitted.
    pub x_error: Vec<Real>,
    /// Session-average y errors, sessions with no data omitted.
    pub y_error: Vec<Real>,
    pub x_stdev: Real,
    pub y_stdev: Real,
    pub x_variance: Real,
    pub y_variance: Real,
    /// Error trend over session time; `None` when unfittable.
    pub x_linefit: Option<LineFit>,
    pub y_linefit: Option<LineFit>,
}

/// Compute per-marker statistics, keyed by marker name.
pub fn subject_statistics(
    markers: &MarkerTable,
    session_times: &[Real],
    averages_per_session: &[Vec<SessionAverage>],
) -> BTreeMap<String, MarkerStatistics> {
    let mut stats = BTreeMap::new();

    for (index, marker) in markers.iter().enumerate() {
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

        let x_linefit = fit_line(&times, &xs).ok();
        let y_linefit = fit_line(&times, &ys).ok();

        stats.insert(
            marker.name.clone(),
            MarkerStatistics {
                x_stdev: std_dev(&xs),
                y_stdev: std_dev(&ys),
                x_variance: variance(&xs),
                y_variance: variance(&ys),
                x_error: xs,
                y_error: ys,
                x_linefit,
                y_linefit,
            },
        );
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazecal_core::MeanError;

    #[test]
    fn digest_covers_every_marker() {
        let markers = MarkerTable::reference_five();
        let times = vec![0.0, 100.0];
        let averages: Vec<Vec<SessionAverage>> = (0..2)
            .map(|s| {
                (0..5)
                    .map(|_| {
                        Some(MeanError {
                            x: 0.01 * (s + 1) as Real,
                            y: 0.0,
                        })
                    })
                    .collect()
            })
            .collect();

        let stats = subject_statistics(&markers, &times, &averages);
        assert_eq!(stats.len(), 5);

        let center = &stats["center"];
        assert_eq!(center.x_error, vec![0.01, 0.02]);
        let fit = center.x_linefit.expect("two sessions fit a line");
        assert!((fit.slope - 0.0001).abs() < 1e-12);
        assert!((center.x_variance - 0.000025).abs() < 1e-12);
    }

    #[test]
    fn missing_sessions_shorten_the_series() {
        let markers = MarkerTable::reference_five();
        let times = vec![0.0, 100.0];
        let mut averages: Vec<Vec<SessionAverage>> = (0..2)
            .map(|_| (0..5).map(|_| Some(MeanError { x: 0.0, y: 0.0 })).collect())
            .collect();
        averages[1][2] = None;

        let stats = subject_statistics(&markers, &times, &averages);
        let top_left = &stats["top_left"];
        assert_eq!(top_left.x_error.len(), 1);
        // One sample cannot be fitted.
        assert!(top_left.x_linefit.is_none());
    }
}
