//! Statistical filtering for gaze-error clouds.
//!
//! Two layers of robustness are applied to each marker's error set before it
//! is averaged:
//! - [`outliers`]: per-point rejection of measurements that do not belong to
//!   the dominant population, with two swappable strategies,
//! - [`cluster`]: when the surviving cloud is still dispersed, k-means with
//!   silhouette-scored model-order selection picks the dominant fixation
//!   mode and discards the rest.
//!
//! Both layers are deterministic: the k-means initialization runs off a
//! fixed seed from the analysis configuration.

pub mod cluster;
pub mod kmeans;
pub mod outliers;
pub mod silhouette;

pub use cluster::select_dominant_mode;
pub use kmeans::{kmeans, KMeansError, KMeansResult};
pub use outliers::{detector_for, LocalDensityDetector, NeighborCountDetector, OutlierDetector};
pub use silhouette::mean_silhouette;
