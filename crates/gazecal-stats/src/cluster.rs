//! Dominant-mode selection for dispersed error clouds.
//!
//! A well-behaved marker produces one tight cloud of gaze errors. When
//! tracking slips mid-interval the cloud splits into modes; the genuine
//! fixation is assumed to be the most populated one and everything else is
//! noise to discard before averaging.

use gazecal_core::{ClusterConfig, Pt2};
use tracing::debug;

use crate::kmeans::kmeans;
use crate::silhouette::mean_silhouette;

/// Reduce an error cloud to its dominant mode.
///
/// If at least `cfg.ok_fraction` of the points fall inside a fixed window
/// centered on the centroid, the cloud is already unimodal and is returned
/// unchanged. Otherwise k-means is run for every cluster count from 2 to
/// `cfg.max_clusters`, the count with the best mean silhouette wins, and
/// the largest cluster (lowest index on ties) is returned.
pub fn select_dominant_mode(points: &[Pt2], cfg: &ClusterConfig) -> Vec<Pt2> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

    let half_w = cfg.window_width / 2.0;
    let half_h = cfg.window_height / 2.0;
    let inside = points
        .iter()
        .filter(|p| (p.x - cx).abs() <= half_w && (p.y - cy).abs() <= half_h)
        .count();

    let fraction = inside as f64 / n;
    if fraction >= cfg.ok_fraction {
        debug!(fraction, "error cloud compact, clustering skipped");
        return points.to_vec();
    }

    // Silhouette needs at least two clusters and one spare point.
    let max_k = cfg.max_clusters.min(points.len() - 1);
    if max_k < 2 {
        return points.to_vec();
    }

    let mut best: Option<(f64, Vec<usize>, usize)> = None;
    for k in 2..=max_k {
        let Ok(result) = kmeans(points, k, cfg.seed) else {
            continue;
        };
        let score = mean_silhouette(points, &result.labels, k);
        debug!(k, score, "model-order candidate");
        if best.as_ref().is_none_or(|(best_score, _, _)| score > *best_score) {
            best = Some((score, result.labels, k));
        }
    }

    let Some((score, labels, k)) = best else {
        return points.to_vec();
    };
    debug!(k, score, "clustering error cloud");

    let mut sizes = vec![0usize; k];
    for &label in &labels {
        sizes[label] += 1;
    }
    let dominant = sizes
        .iter()
        .enumerate()
        .max_by(|(i, a), (j, b)| a.cmp(b).then(j.cmp(i)))
        .map(|(i, _)| i)
        .unwrap_or(0);

    points
        .iter()
        .zip(labels.iter())
        .filter(|(_, &label)| label == dominant)
        .map(|(p, _)| *p)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazecal_core::ClusterConfig;

    fn cfg() -> ClusterConfig {
        ClusterConfig::default()
    }

    #[test]
    fn compact_cloud_is_returned_unchanged() {
        // 95% of points inside the window, 5% scattered: above the 0.9
        // default threshold, so no clustering.
        let mut points: Vec<Pt2> = (0..19)
            .map(|i| Pt2::new(0.5 + 0.0005 * (i % 5) as f64, 0.5 + 0.0005 * (i / 5) as f64))
            .collect();
        points.push(Pt2::new(0.52, 0.95));

        let kept = select_dominant_mode(&points, &cfg());
        assert_eq!(kept.len(), points.len());
    }

    #[test]
    fn dispersed_cloud_keeps_largest_mode() {
        // 20 points in the true fixation mode, 8 in a spurious one.
        let mut points = Vec::new();
        for i in 0..20 {
            points.push(Pt2::new(0.30 + 0.001 * (i % 4) as f64, 0.40 + 0.001 * (i / 4) as f64));
        }
        for i in 0..8 {
            points.push(Pt2::new(0.70 + 0.001 * i as f64, 0.10));
        }

        let kept = select_dominant_mode(&points, &cfg());
        assert_eq!(kept.len(), 20);
        assert!(kept.iter().all(|p| p.x < 0.5));
    }

    #[test]
    fn tiny_input_is_returned_unchanged() {
        let points = vec![Pt2::new(0.1, 0.1), Pt2::new(0.9, 0.9)];
        let kept = select_dominant_mode(&points, &cfg());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn selection_is_deterministic() {
        let mut points = Vec::new();
        for i in 0..15 {
            points.push(Pt2::new(0.2 + 0.002 * i as f64, 0.3));
        }
        for i in 0..10 {
            points.push(Pt2::new(0.8, 0.6 + 0.002 * i as f64));
        }
        let a = select_dominant_mode(&points, &cfg());
        let b = select_dominant_mode(&points, &cfg());
        assert_eq!(a, b);
    }
}
