//! Outlier rejection strategies for per-marker error sets.
//!
//! Both strategies shipped at different points of the pipeline's history and
//! both remain in use, so they live behind one trait and are selected by
//! configuration. The contract is shared: return the indices whose local
//! neighborhood density is markedly below that of the majority.

use gazecal_core::{ErrorSample, OutlierPolicyConfig, Real};

/// A strategy flagging points that do not belong to the dominant population.
pub trait OutlierDetector {
    /// Indices into `errors` considered outliers.
    fn detect(&self, errors: &[ErrorSample]) -> Vec<usize>;
}

/// Build the configured detector.
pub fn detector_for(cfg: &OutlierPolicyConfig) -> Box<dyn OutlierDetector> {
    match *cfg {
        OutlierPolicyConfig::NeighborCount { k, threshold } => {
            Box::new(NeighborCountDetector { k, threshold })
        }
        OutlierPolicyConfig::LocalDensity { k, threshold } => {
            Box::new(LocalDensityDetector { k, threshold })
        }
    }
}

/// Neighbor-count test on the combined error magnitude.
///
/// A point is valid when at least `k` other points have a combined magnitude
/// `|x| + |y|` within `threshold` of it. Direction is ignored: two errors of
/// similar size pointing different ways still count as neighbors.
#[derive(Debug, Clone, Copy)]
pub struct NeighborCountDetector {
    pub k: usize,
    pub threshold: Real,
}

impl OutlierDetector for NeighborCountDetector {
    fn detect(&self, errors: &[ErrorSample]) -> Vec<usize> {
        let combined: Vec<Real> = errors.iter().map(ErrorSample::combined).collect();

        let mut outliers = Vec::new();
        for (index, &value) in combined.iter().enumerate() {
            let mut neighbors = 0usize;
            let mut valid = false;
            for (other_index, &other) in combined.iter().enumerate() {
                if index == other_index {
                    continue;
                }
                if (value - other).abs() < self.threshold {
                    neighbors += 1;
                    if neighbors >= self.k {
                        valid = true;
                        break;
                    }
                }
            }
            if !valid {
                outliers.push(index);
            }
        }
        outliers
    }
}

/// Local-outlier-factor test over the full 2-D error vectors.
///
/// Points whose local reachability density falls below that of their `k`
/// nearest neighbors get a factor above 1; those exceeding `threshold` are
/// flagged. Sets with `k` or fewer points cannot be judged and produce no
/// outliers.
#[derive(Debug, Clone, Copy)]
pub struct LocalDensityDetector {
    pub k: usize,
    pub threshold: Real,
}

impl OutlierDetector for LocalDensityDetector {
    fn detect(&self, errors: &[ErrorSample]) -> Vec<usize> {
        let n = errors.len();
        if self.k == 0 || n <= self.k {
            return Vec::new();
        }

        let dist = |a: &ErrorSample, b: &ErrorSample| -> Real {
            let dx = a.x_error - b.x_error;
            let dy = a.y_error - b.y_error;
            (dx * dx + dy * dy).sqrt()
        };

        // k-distance and neighborhood (ties included) for every point.
        let mut k_dist = vec![0.0; n];
        let mut neighborhoods: Vec<Vec<usize>> = Vec::with_capacity(n);
        for i in 0..n {
            let mut dists: Vec<(usize, Real)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, dist(&errors[i], &errors[j])))
                .collect();
            dists.sort_by(|a, b| a.1.total_cmp(&b.1));
            k_dist[i] = dists[self.k - 1].1;
            neighborhoods.push(
                dists
                    .iter()
                    .take_while(|(_, d)| *d <= k_dist[i])
                    .map(|(j, _)| *j)
                    .collect(),
            );
        }

        // Local reachability density; duplicates collapse distance to zero,
        // which sends the density to infinity.
        let mut lrd = vec![0.0; n];
        for i in 0..n {
            let reach_sum: Real = neighborhoods[i]
                .iter()
                .map(|&j| k_dist[j].max(dist(&errors[i], &errors[j])))
                .sum();
            lrd[i] = if reach_sum > 0.0 {
                neighborhoods[i].len() as Real / reach_sum
            } else {
                Real::INFINITY
            };
        }

        let mut outliers = Vec::new();
        for i in 0..n {
            let ratios: Vec<Real> = neighborhoods[i]
                .iter()
                .map(|&j| match (lrd[j].is_infinite(), lrd[i].is_infinite()) {
                    (true, true) => 1.0,
                    (false, true) => 0.0,
                    (true, false) => Real::INFINITY,
                    (false, false) => lrd[j] / lrd[i],
                })
                .collect();
            let lof = ratios.iter().sum::<Real>() / ratios.len() as Real;
            if lof > self.threshold {
                outliers.push(i);
            }
        }
        outliers
    }
}
