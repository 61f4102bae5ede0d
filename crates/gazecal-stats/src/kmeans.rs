//! Seeded k-means with k-means++ initialization.
//!
//! The clustering runs off a caller-supplied seed so repeated analysis runs
//! partition identically; there is no global random state.

use gazecal_core::{Pt2, Real};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

const MAX_ITERS: usize = 100;

#[derive(Debug, Error)]
pub enum KMeansError {
    #[error("need at least {k} points for {k} clusters, got {points}")]
    TooFewPoints { points: usize, k: usize },
    #[error("cluster count must be at least 1")]
    ZeroClusters,
}

/// Result of one k-means run.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster assignment per input point.
    pub labels: Vec<usize>,
    pub centroids: Vec<Pt2>,
    pub iterations: usize,
    pub converged: bool,
}

fn dist_sq(a: &Pt2, b: &Pt2) -> Real {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// k-means++ seeding: subsequent centers are drawn proportionally to the
/// squared distance from the nearest already-chosen center.
fn seed_centroids(points: &[Pt2], k: usize, rng: &mut StdRng) -> Vec<Pt2> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())]);

    while centroids.len() < k {
        let weights: Vec<Real> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| dist_sq(p, c))
                    .fold(Real::INFINITY, Real::min)
            })
            .collect();
        let total: Real = weights.iter().sum();

        let next = if total > 0.0 {
            let mut target = rng.random::<Real>() * total;
            let mut chosen = points.len() - 1;
            for (i, &w) in weights.iter().enumerate() {
                target -= w;
                if target <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // All remaining points coincide with a center.
            rng.random_range(0..points.len())
        };
        centroids.push(points[next]);
    }
    centroids
}

fn nearest_centroid(point: &Pt2, centroids: &[Pt2]) -> usize {
    let mut best = 0;
    let mut best_d = Real::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = dist_sq(point, c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Partition `points` into `k` clusters with Lloyd's algorithm.
pub fn kmeans(points: &[Pt2], k: usize, seed: u64) -> Result<KMeansResult, KMeansError> {
    if k == 0 {
        return Err(KMeansError::ZeroClusters);
    }
    if points.len() < k {
        return Err(KMeansError::TooFewPoints {
            points: points.len(),
            k,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_centroids(points, k, &mut rng);
    let mut labels: Vec<usize> = points.iter().map(|p| nearest_centroid(p, &centroids)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < MAX_ITERS {
        iterations += 1;

        // Update step.
        let mut sums = vec![(0.0, 0.0, 0usize); k];
        for (point, &label) in points.iter().zip(labels.iter()) {
            sums[label].0 += point.x;
            sums[label].1 += point.y;
            sums[label].2 += 1;
        }
        for (c, &(sx, sy, count)) in centroids.iter_mut().zip(sums.iter()) {
            if count > 0 {
                *c = Pt2::new(sx / count as Real, sy / count as Real);
            }
        }
        // An emptied cluster steals the point farthest from its centroid.
        for cluster in 0..k {
            if sums[cluster].2 == 0 {
                let mut farthest: Option<(usize, Real)> = None;
                for (i, point) in points.iter().enumerate() {
                    let d = dist_sq(point, &centroids[labels[i]]);
                    if farthest.is_none_or(|(_, best)| d > best) {
                        farthest = Some((i, d));
                    }
                }
                if let Some((i, _)) = farthest {
                    centroids[cluster] = points[i];
                    labels[i] = cluster;
                }
            }
        }

        // Assignment step.
        let new_labels: Vec<usize> = points.iter().map(|p| nearest_centroid(p, &centroids)).collect();
        if new_labels == labels {
            converged = true;
            break;
        }
        labels = new_labels;
    }

    Ok(KMeansResult {
        labels,
        centroids,
        iterations,
        converged,
    })
}
