//! Where to build: coverage gaps and ranked site recommendations.

pub mod gap;
pub mod placement;

pub use gap::{GapAnalysis, GapDetector, GapSummary};
pub use placement::{Placement, PlacementParams, PlacementRecommender, RecommendedSite};
