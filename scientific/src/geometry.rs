use crate::Result;
use mpase_core::{mask_and_count, mask_count, Error, Mask};
use nalgebra::Point2;
use rayon::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Smoothing term keeping IoU of two empty masks at 0.
pub const IOU_EPS: f64 = 1e-9;

/// Intersection over union of the set pixels of two equally sized masks.
pub fn iou(a: &Mask, b: &Mask) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::invalid_input(format!(
            "mask size mismatch: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let inter = mask_and_count(a, b);
    let union = mask_count(a) + mask_count(b) - inter;
    Ok(inter as f64 / (union as f64 + IOU_EPS))
}

// Wrapper for RTree
pub(crate) struct PointWrapper(pub(crate) [f64; 2]);

impl RTreeObject for PointWrapper {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.0)
    }
}

impl PointDistance for PointWrapper {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.0[0] - point[0];
        let dy = self.0[1] - point[1];
        dx * dx + dy * dy
    }
}

pub(crate) fn build_tree(points: &[Point2<f64>]) -> RTree<PointWrapper> {
    RTree::bulk_load(points.iter().map(|p| PointWrapper([p.x, p.y])).collect())
}

/// Distance from every query to its nearest point of `tree`.
fn nearest_distances(tree: &RTree<PointWrapper>, queries: &[Point2<f64>]) -> Vec<f64> {
    queries
        .par_iter()
        .map(|q| {
            let q = [q.x, q.y];
            tree.nearest_neighbor(&q)
                .map_or(f64::INFINITY, |n| n.distance_2(&q).sqrt())
        })
        .collect()
}

/// Symmetric contour distances `(mean_nn, hausdorff)`.
///
/// `mean_nn` averages the two directed mean nearest distances, `hausdorff` is
/// the larger directed maximum. An absent or empty contour on either side
/// gives `(NaN, NaN)`.
pub fn contour_distances(a: Option<&[Point2<f64>]>, b: Option<&[Point2<f64>]>) -> (f64, f64) {
    let (Some(a), Some(b)) = (a, b) else {
        return (f64::NAN, f64::NAN);
    };
    if a.is_empty() || b.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let ta = build_tree(a);
    let tb = build_tree(b);
    let da = nearest_distances(&ta, b);
    let db = nearest_distances(&tb, a);

    let mean = |d: &[f64]| d.iter().sum::<f64>() / d.len() as f64;
    let max = |d: &[f64]| d.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    ((mean(&da) + mean(&db)) / 2.0, max(&da).max(max(&db)))
}
