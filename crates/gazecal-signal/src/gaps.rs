//! Measurement-gap clustering and blink removal.
//!
//! The eye camera drops samples when the subject blinks or the pupil is
//! briefly lost. Such dropouts show up as timestamp gaps; samples recorded
//! right before and after a blink are unreliable and are eliminated. Long,
//! well-populated gap clusters indicate deliberate absence (marker off
//! screen) and are kept.

use gazecal_core::{GapCluster, GapConfig, GazeRecord};
use tracing::debug;

/// Output of one gap-filter pass.
#[derive(Debug, Clone)]
pub struct GapFilterResult {
    /// Records that survived blink elimination, in input order.
    pub retained: Vec<GazeRecord>,
    /// Merged gap clusters found in the stream.
    pub clusters: Vec<GapCluster>,
    /// Number of records removed.
    pub eliminated: usize,
}

/// Remove blink artifacts from a gaze stream.
///
/// Records with `frame_index < start_frame` only seed the gap timing and are
/// not retained. A gap is an inter-sample interval exceeding
/// `cfg.gap_threshold`; consecutive gaps closer than `cfg.cluster_threshold`
/// merge into one cluster. Records within `cfg.blink_margin` of a cluster
/// that is short (`duration < blink_margin`) or sparse
/// (`count < min_cluster_size`) are eliminated.
pub fn filter_gaps(records: &[GazeRecord], start_frame: u64, cfg: &GapConfig) -> GapFilterResult {
    let mut eligible = Vec::with_capacity(records.len());
    let mut gap_times = Vec::new();
    let mut previous_time: Option<f64> = None;

    for record in records {
        if record.frame_index < start_frame {
            previous_time = Some(record.timestamp);
            continue;
        }
        if let Some(prev) = previous_time {
            if record.timestamp - prev > cfg.gap_threshold {
                gap_times.push(record.timestamp);
            }
        }
        previous_time = Some(record.timestamp);
        eligible.push(record.clone());
    }

    let clusters = cluster_gaps(&gap_times, cfg.cluster_threshold);
    debug!(
        gaps = gap_times.len(),
        clusters = clusters.len(),
        "gap scan complete"
    );
    for cluster in &clusters {
        debug!(
            count = cluster.count,
            start = cluster.start_time,
            end = cluster.end_time,
            "gap cluster"
        );
    }

    if clusters.is_empty() {
        return GapFilterResult {
            retained: eligible,
            clusters,
            eliminated: 0,
        };
    }

    let mut retained = Vec::with_capacity(eligible.len());
    let mut eliminated = 0usize;
    let mut next = 0usize;

    for record in eligible {
        while next + 1 < clusters.len()
            && record.timestamp > clusters[next].end_time + cfg.blink_margin
        {
            next += 1;
        }
        // Margins of adjacent clusters may overlap, so the record is tested
        // against the cluster at the cursor and the one after it.
        let in_blink_zone = clusters[next..clusters.len().min(next + 2)]
            .iter()
            .any(|c| is_blink(c, cfg) && within_margin(record.timestamp, c, cfg.blink_margin));

        if in_blink_zone {
            eliminated += 1;
        } else {
            retained.push(record);
        }
    }

    debug!(
        retained = retained.len(),
        eliminated, "blink removal complete"
    );

    GapFilterResult {
        retained,
        clusters,
        eliminated,
    }
}

/// Merge gap timestamps into clusters separated by at least `threshold`.
fn cluster_gaps(gap_times: &[f64], threshold: f64) -> Vec<GapCluster> {
    let mut clusters: Vec<GapCluster> = Vec::new();

    for &gap in gap_times {
        let extends = clusters
            .last()
            .is_some_and(|cluster| gap - cluster.end_time < threshold);
        if extends {
            if let Some(cluster) = clusters.last_mut() {
                cluster.end_time = gap;
                cluster.count += 1;
            }
        } else {
            clusters.push(GapCluster {
                count: 1,
                start_time: gap,
                end_time: gap,
            });
        }
    }

    clusters
}

fn is_blink(cluster: &GapCluster, cfg: &GapConfig) -> bool {
    cluster.duration() < cfg.blink_margin || cluster.count < cfg.min_cluster_size
}

fn within_margin(timestamp: f64, cluster: &GapCluster, margin: f64) -> bool {
    timestamp > cluster.start_time - margin && timestamp < cluster.end_time + margin
}
