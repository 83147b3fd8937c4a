use mpase_core::{Error, Result};
use nalgebra::{Matrix3, Point3};
use rayon::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

// Wrapper for RTree
struct IndexedPoint(usize, [f64; 3]);

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.1)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.1[0] - point[0];
        let dy = self.1[1] - point[1];
        let dz = self.1[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Exact nearest-neighbour index over a fixed 3D point set.
pub struct NearestIndex3 {
    tree: RTree<IndexedPoint>,
    len: usize,
}

impl NearestIndex3 {
    pub fn new(points: &[Point3<f64>]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::invalid_input("cannot index an empty point set"));
        }
        let wrappers: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint(i, [p.x, p.y, p.z]))
            .collect();
        Ok(Self {
            tree: RTree::bulk_load(wrappers),
            len: points.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of and distance to the closest indexed point.
    pub fn nearest(&self, query: &Point3<f64>) -> (usize, f64) {
        let q = [query.x, query.y, query.z];
        self.tree
            .nearest_neighbor(&q)
            .map_or((usize::MAX, f64::INFINITY), |n| (n.0, n.distance_2(&q).sqrt()))
    }

    pub fn nearest_all(&self, queries: &[Point3<f64>]) -> Vec<(usize, f64)> {
        queries.par_iter().map(|q| self.nearest(q)).collect()
    }

    pub fn distances(&self, queries: &[Point3<f64>]) -> Vec<f64> {
        queries.par_iter().map(|q| self.nearest(q).1).collect()
    }

    /// Nearest distances of `rotation * q` for every query.
    pub fn distances_rotated(&self, queries: &[Point3<f64>], rotation: &Matrix3<f64>) -> Vec<f64> {
        queries
            .par_iter()
            .map(|q| self.nearest(&Point3::from(rotation * q.coords)).1)
            .collect()
    }
}

/// Sum of squared distances, gathered in query order.
pub(crate) fn sum_sq(distances: &[f64]) -> f64 {
    distances.iter().map(|d| d * d).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_exact_neighbour() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let index = NearestIndex3::new(&pts).unwrap();
        let (i, d) = index.nearest(&Point3::new(0.9, 0.1, 0.0));
        assert_eq!(i, 1);
        assert!((d - (0.02f64).sqrt()).abs() < 1e-12);
        assert!(NearestIndex3::new(&[]).is_err());
    }
}
