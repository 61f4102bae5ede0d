//! Mean silhouette score for model-order selection.

use gazecal_core::{Pt2, Real};

fn dist(a: &Pt2, b: &Pt2) -> Real {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Mean silhouette coefficient of a labeled partition.
///
/// Per point: `s = (b - a) / max(a, b)` where `a` is the mean distance to
/// the point's own cluster and `b` the smallest mean distance to any other
/// cluster. Singleton clusters score 0 for their point, matching the usual
/// convention. The mean over all points is returned; higher is better.
pub fn mean_silhouette(points: &[Pt2], labels: &[usize], k: usize) -> Real {
    debug_assert_eq!(points.len(), labels.len());
    if points.is_empty() {
        return 0.0;
    }

    let cluster_sizes = {
        let mut sizes = vec![0usize; k];
        for &label in labels {
            sizes[label] += 1;
        }
        sizes
    };

    let mut total = 0.0;
    for (i, point) in points.iter().enumerate() {
        let own = labels[i];
        if cluster_sizes[own] <= 1 {
            continue; // contributes 0
        }

        // Mean distance to each cluster.
        let mut sums = vec![0.0; k];
        for (j, other) in points.iter().enumerate() {
            if i != j {
                sums[labels[j]] += dist(point, other);
            }
        }

        let a = sums[own] / (cluster_sizes[own] - 1) as Real;
        let b = (0..k)
            .filter(|&c| c != own && cluster_sizes[c] > 0)
            .map(|c| sums[c] / cluster_sizes[c] as Real)
            .fold(Real::INFINITY, Real::min);

        if b.is_finite() {
            let denom = a.max(b);
            if denom > 0.0 {
                total += (b - a) / denom;
            }
        }
    }

    total / points.len() as Real
}
