//! Radius queries between two point sets.
//!
//! Two interchangeable backends answer "which reference points lie within
//! `radius_km` of each query point":
//!
//! - brute force, `O(N·M)` haversine evaluations
//! - an R-tree over unit-sphere Cartesian coordinates
//!
//! Chord length on the unit sphere is monotone in great-circle distance, so
//! the R-tree pre-filters on chord length and confirms each candidate with the
//! same haversine test the brute-force path uses. Both backends therefore
//! return the same counts and indices.

use std::fmt;

use rayon::prelude::*;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::point::{EARTH_RADIUS_KM, GeoPoint, validate_points};
use crate::error::InputError;

/// Slack added to the squared chord pre-filter so boundary points reach the
/// exact haversine check.
const CHORD_SLACK: f64 = 1e-9;

/// Backend selection for [`GeoIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// Brute force up to `brute_force_limit` reference points, R-tree above.
    #[default]
    Auto,
    BruteForce,
    #[serde(rename = "rtree")]
    RTree,
}

#[derive(Debug, Clone, Copy)]
struct UnitPoint {
    idx: usize,
    xyz: [f64; 3],
}

impl RTreeObject for UnitPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

impl PointDistance for UnitPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.xyz[0] - point[0];
        let dy = self.xyz[1] - point[1];
        let dz = self.xyz[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// A validated reference point set answering radius queries.
pub struct GeoIndex {
    reference: Vec<GeoPoint>,
    tree: Option<RTree<UnitPoint>>,
}

impl fmt::Debug for GeoIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoIndex")
            .field("points", &self.reference.len())
            .field("accelerated", &self.tree.is_some())
            .finish()
    }
}

impl GeoIndex {
    /// Builds an index over `reference`.
    ///
    /// With [`IndexMode::Auto`] the R-tree is only built when there are more
    /// than `brute_force_limit` reference points.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` if any reference point is out of range.
    pub fn build(
        reference: &[GeoPoint],
        mode: IndexMode,
        brute_force_limit: usize,
    ) -> Result<Self, InputError> {
        validate_points(reference)?;

        let use_tree = match mode {
            IndexMode::BruteForce => false,
            IndexMode::RTree => true,
            IndexMode::Auto => reference.len() > brute_force_limit,
        };

        let tree = use_tree.then(|| {
            let units: Vec<UnitPoint> = reference
                .iter()
                .enumerate()
                .map(|(idx, p)| UnitPoint {
                    idx,
                    xyz: p.unit_vector(),
                })
                .collect();
            RTree::bulk_load(units)
        });

        debug!(
            points = reference.len(),
            rtree = use_tree,
            "built geo index"
        );

        Ok(Self {
            reference: reference.to_vec(),
            tree,
        })
    }

    /// Number of reference points.
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    /// Returns `true` when the index holds no reference points.
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Returns `true` when queries go through the R-tree.
    pub fn is_accelerated(&self) -> bool {
        self.tree.is_some()
    }

    /// Counts, for each query point, the reference points within `radius_km`.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` for an invalid radius or query point.
    pub fn count_within(&self, queries: &[GeoPoint], radius_km: f64) -> Result<Vec<usize>, InputError> {
        check_radius(radius_km)?;
        validate_points(queries)?;

        let counts = match &self.tree {
            Some(tree) => queries
                .par_iter()
                .map(|q| self.tree_matches(tree, q, radius_km).count())
                .collect(),
            None => queries
                .par_iter()
                .map(|q| {
                    self.reference
                        .iter()
                        .filter(|r| q.haversine_km(r) <= radius_km)
                        .count()
                })
                .collect(),
        };
        Ok(counts)
    }

    /// Returns, for each query point, the ascending indices of the reference
    /// points within `radius_km`.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` for an invalid radius or query point.
    pub fn within_indices(
        &self,
        queries: &[GeoPoint],
        radius_km: f64,
    ) -> Result<Vec<Vec<usize>>, InputError> {
        check_radius(radius_km)?;
        validate_points(queries)?;

        let indices = match &self.tree {
            Some(tree) => queries
                .par_iter()
                .map(|q| {
                    let mut hits: Vec<usize> = self.tree_matches(tree, q, radius_km).collect();
                    hits.sort_unstable();
                    hits
                })
                .collect(),
            None => queries
                .par_iter()
                .map(|q| {
                    self.reference
                        .iter()
                        .enumerate()
                        .filter(|(_, r)| q.haversine_km(r) <= radius_km)
                        .map(|(i, _)| i)
                        .collect()
                })
                .collect(),
        };
        Ok(indices)
    }

    fn tree_matches<'a>(
        &'a self,
        tree: &'a RTree<UnitPoint>,
        query: &'a GeoPoint,
        radius_km: f64,
    ) -> impl Iterator<Item = usize> + 'a {
        let max_chord_2 = squared_chord(radius_km) + CHORD_SLACK;
        tree.locate_within_distance(query.unit_vector(), max_chord_2)
            .filter(move |u| query.haversine_km(&self.reference[u.idx]) <= radius_km)
            .map(|u| u.idx)
    }
}

/// Squared unit-sphere chord length spanning `radius_km` of arc.
fn squared_chord(radius_km: f64) -> f64 {
    let half_angle = (radius_km / EARTH_RADIUS_KM / 2.0).min(std::f64::consts::FRAC_PI_2);
    let chord = 2.0 * half_angle.sin();
    chord * chord
}

fn check_radius(radius_km: f64) -> Result<(), InputError> {
    if radius_km.is_finite() && radius_km >= 0.0 {
        Ok(())
    } else {
        Err(InputError::InvalidRadius(radius_km))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn scatter(n: usize, seed: u64) -> Vec<GeoPoint> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                GeoPoint::new(
                    rng.random_range(12.0..13.5),
                    rng.random_range(77.0..78.5),
                )
            })
            .collect()
    }

    #[test]
    fn counts_points_inside_radius() {
        let stations = vec![GeoPoint::new(28.70, 77.10), GeoPoint::new(28.71, 77.10)];
        let index = GeoIndex::build(&stations, IndexMode::BruteForce, 0).unwrap();
        let counts = index.count_within(&[GeoPoint::new(28.70, 77.10)], 5.0).unwrap();
        assert_eq!(counts, vec![2]);
    }

    #[test]
    fn rtree_matches_brute_force() {
        let reference = scatter(400, 1);
        let queries = scatter(150, 2);

        let brute = GeoIndex::build(&reference, IndexMode::BruteForce, 0).unwrap();
        let tree = GeoIndex::build(&reference, IndexMode::RTree, 0).unwrap();
        assert!(tree.is_accelerated());

        for radius in [0.0, 1.0, 5.0, 25.0, 300.0] {
            let a = brute.within_indices(&queries, radius).unwrap();
            let b = tree.within_indices(&queries, radius).unwrap();
            assert_eq!(a, b, "backends disagree at radius {radius}");
        }
    }

    #[test]
    fn auto_mode_switches_on_size() {
        let reference = scatter(50, 3);
        let small = GeoIndex::build(&reference, IndexMode::Auto, 100).unwrap();
        let large = GeoIndex::build(&reference, IndexMode::Auto, 10).unwrap();
        assert!(!small.is_accelerated());
        assert!(large.is_accelerated());
    }

    #[test]
    fn huge_radius_covers_the_globe() {
        let reference = vec![GeoPoint::new(60.0, 10.0), GeoPoint::new(-40.0, -170.0)];
        let index = GeoIndex::build(&reference, IndexMode::RTree, 0).unwrap();
        let counts = index.count_within(&[GeoPoint::new(0.0, 0.0)], 30_000.0).unwrap();
        assert_eq!(counts, vec![2]);
    }

    #[test]
    fn zero_radius_matches_only_identical_coordinates() {
        let reference = vec![GeoPoint::new(10.0, 10.0), GeoPoint::new(10.0001, 10.0)];
        let index = GeoIndex::build(&reference, IndexMode::BruteForce, 0).unwrap();
        let counts = index.count_within(&[GeoPoint::new(10.0, 10.0)], 0.0).unwrap();
        assert_eq!(counts, vec![1]);
    }

    #[test]
    fn rejects_invalid_reference_point() {
        let err = GeoIndex::build(&[GeoPoint::new(0.0, 200.0)], IndexMode::Auto, 10);
        assert!(matches!(
            err,
            Err(InputError::LongitudeOutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_invalid_query_point_and_radius() {
        let index = GeoIndex::build(&[GeoPoint::new(0.0, 0.0)], IndexMode::Auto, 10).unwrap();
        let bad_query = index.count_within(&[GeoPoint::new(-95.0, 0.0)], 1.0);
        assert!(matches!(bad_query, Err(InputError::LatitudeOutOfRange { .. })));

        let bad_radius = index.count_within(&[GeoPoint::new(0.0, 0.0)], -1.0);
        assert_eq!(bad_radius, Err(InputError::InvalidRadius(-1.0)));
    }

    #[test]
    fn empty_reference_counts_zero() {
        let index = GeoIndex::build(&[], IndexMode::RTree, 0).unwrap();
        let counts = index.count_within(&[GeoPoint::new(1.0, 1.0)], 10.0).unwrap();
        assert_eq!(counts, vec![0]);
    }
}
