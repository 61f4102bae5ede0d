//! Immutable analysis configuration.
//!
//! All thresholds live here instead of scattered module constants; the
//! configuration is validated once at process start and then passed by
//! reference into each stage entry point.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::markers::MarkerTable;
use crate::math::Real;

/// Gap detection and blink removal thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapConfig {
    /// A gap exists when consecutive gaze timestamps differ by more
    /// than this many seconds.
    pub gap_threshold: Real,
    /// Gaps closer together than this are merged into one cluster.
    pub cluster_threshold: Real,
    /// Records within this margin of a blink cluster are eliminated.
    pub blink_margin: Real,
    /// Clusters with at least this many gaps and a span longer than the
    /// blink margin are treated as deliberate absence and kept.
    pub min_cluster_size: usize,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            gap_threshold: 0.0043,
            cluster_threshold: 0.1,
            blink_margin: 0.2,
            min_cluster_size: 5,
        }
    }
}

/// Calibration symbol visibility thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalConfig {
    /// A symbol is appearing when the ROI minimum brightness drops below
    /// this value.
    pub visible_threshold: Real,
    /// A visible symbol is gone when the ROI minimum rises above this value.
    pub fade_threshold: Real,
    /// Frames up to and including this index are ignored (leading blanks).
    pub starting_frame: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            visible_threshold: 170.0,
            fade_threshold: 170.0,
            starting_frame: 10,
        }
    }
}

/// Outlier detection strategy selection.
///
/// Both policies shipped in production; the neighbor-count test over the
/// combined error magnitude is the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OutlierPolicyConfig {
    /// A point is valid when at least `k` other points have a combined
    /// magnitude within `threshold` of it.
    NeighborCount { k: usize, threshold: Real },
    /// Local-outlier-factor over the full 2-D error vectors; points whose
    /// factor exceeds `threshold` are flagged.
    LocalDensity { k: usize, threshold: Real },
}

impl Default for OutlierPolicyConfig {
    fn default() -> Self {
        Self::NeighborCount {
            k: 3,
            threshold: 0.02,
        }
    }
}

/// Dominant-mode selection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Width of the dispersion-check window centered on the centroid.
    pub window_width: Real,
    /// Height of the dispersion-check window.
    pub window_height: Real,
    /// Clustering is skipped when this fraction of points falls inside
    /// the window.
    pub ok_fraction: Real,
    /// Largest cluster count tried during model-order selection.
    pub max_clusters: usize,
    /// Seed for the k-means initialization, fixed for reproducible runs.
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            window_width: 0.041,
            window_height: 0.072,
            ok_fraction: 0.9,
            max_clusters: 5,
            seed: 1,
        }
    }
}

/// Session timeline construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// A calibration check follows every `checks_every` normal segments.
    pub checks_every: usize,
    /// Assumed length of one calibration check in seconds.
    pub check_length_seconds: Real,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            checks_every: 4,
            check_length_seconds: 10.0,
        }
    }
}

/// Complete configuration for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub gaps: GapConfig,
    #[serde(default)]
    pub intervals: IntervalConfig,
    #[serde(default)]
    pub outliers: OutlierPolicyConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub markers: MarkerTable,
}

impl AnalysisConfig {
    /// Validate the configuration once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: Real) -> Result<(), ConfigError> {
            if value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NonPositive { name, value })
            }
        }

        positive("gaps.gap_threshold", self.gaps.gap_threshold)?;
        positive("gaps.cluster_threshold", self.gaps.cluster_threshold)?;
        positive("gaps.blink_margin", self.gaps.blink_margin)?;
        positive("cluster.window_width", self.cluster.window_width)?;
        positive("cluster.window_height", self.cluster.window_height)?;
        positive(
            "timeline.check_length_seconds",
            self.timeline.check_length_seconds,
        )?;

        if self.intervals.fade_threshold < self.intervals.visible_threshold {
            return Err(ConfigError::InvertedThresholds {
                visible: self.intervals.visible_threshold,
                fade: self.intervals.fade_threshold,
            });
        }

        if !(self.cluster.ok_fraction > 0.0 && self.cluster.ok_fraction <= 1.0) {
            return Err(ConfigError::FractionOutOfRange {
                name: "cluster.ok_fraction",
                value: self.cluster.ok_fraction,
            });
        }
        if self.cluster.max_clusters < 2 {
            return Err(ConfigError::TooFewClusters {
                value: self.cluster.max_clusters,
            });
        }

        match self.outliers {
            OutlierPolicyConfig::NeighborCount { threshold, .. }
            | OutlierPolicyConfig::LocalDensity { threshold, .. } => {
                positive("outliers.threshold", threshold)?;
            }
        }

        if self.timeline.checks_every == 0 {
            return Err(ConfigError::NonPositive {
                name: "timeline.checks_every",
                value: 0.0,
            });
        }

        // Drift anchoring needs a homography, so four outer markers minimum.
        if self.markers.outer_indices().count() < 4 {
            return Err(ConfigError::TooFewMarkers {
                found: self.markers.len(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let mut cfg = AnalysisConfig::default();
        cfg.gaps.gap_threshold = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive { name, .. }) if name == "gaps.gap_threshold"
        ));
    }

    #[test]
    fn rejects_fade_below_visible() {
        let mut cfg = AnalysisConfig::default();
        cfg.intervals.visible_threshold = 170.0;
        cfg.intervals.fade_threshold = 150.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedThresholds { .. })
        ));
    }

    #[test]
    fn rejects_small_marker_table() {
        let mut cfg = AnalysisConfig::default();
        cfg.markers = MarkerTable::new(
            MarkerTable::reference_five()
                .iter()
                .take(3)
                .cloned()
                .collect(),
        );
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TooFewMarkers { found: 3 })
        ));
    }

    #[test]
    fn config_json_roundtrip() {
        let cfg = AnalysisConfig::default();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn outlier_policy_tagged_json() {
        let policy = OutlierPolicyConfig::LocalDensity {
            k: 10,
            threshold: 1.5,
        };
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("local_density"), "json: {json}");
        let back: OutlierPolicyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
