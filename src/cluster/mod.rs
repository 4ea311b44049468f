//! Clustering primitives and station grouping.

pub mod dbscan;
/// k-means with k-means++ seeding and seeded restarts.
pub mod kmeans;
pub mod scale;
pub mod silhouette;
/// Station clustering (k-means selection and DBSCAN variant).
pub mod stations;

pub use dbscan::{Dbscan, NOISE};
pub use kmeans::{KMeansFit, KMeansParams};
pub use scale::StandardScaler;
pub use silhouette::silhouette_score;
pub use stations::{
    ClusterSummary, ClustererParams, DensityClustering, ElbowPoint, StationClusterer,
    StationClustering,
};
