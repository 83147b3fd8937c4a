//! Plane projections of aligned sets and the background context mask.

use crate::grid::Grid;
use mpase_core::{mask_or_assign, new_mask, AlignedPointSet, Mask, Plane};
use mpase_imgproc::rasterize_points;
use nalgebra::{Point2, Point3};

/// Disk radius of the background splats.
pub const BACKGROUND_DISK_PX: u32 = 2;

/// Drop the plane's third axis.
pub fn project(points: &[Point3<f64>], plane: Plane) -> Vec<Point2<f64>> {
    let (i, j) = plane.axes();
    points.iter().map(|p| Point2::new(p[i], p[j])).collect()
}

/// All labels projected onto one plane together with its pixel centres.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneProjection {
    pub plane: Plane,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// `(label, projected points)` in input order.
    pub sets: Vec<(String, Vec<Point2<f64>>)>,
}

impl PlaneProjection {
    pub fn new(sets: &[AlignedPointSet], grid: &Grid, plane: Plane) -> Self {
        let (xs, ys) = grid.pixel_centers(plane);
        let sets = sets
            .iter()
            .map(|s| (s.label.clone(), project(&s.points, plane)))
            .collect();
        Self { plane, xs, ys, sets }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.xs.len() as u32, self.ys.len() as u32)
    }

    pub fn points(&self, label: &str) -> Option<&[Point2<f64>]> {
        self.sets
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| p.as_slice())
    }

    /// Union of every label's disk splats.
    pub fn background_mask(&self) -> Mask {
        let (nx, ny) = self.size();
        let mut mask = new_mask(nx, ny);
        for (_, pts) in &self.sets {
            let m = rasterize_points(pts, &self.xs, &self.ys, BACKGROUND_DISK_PX);
            mask_or_assign(&mut mask, &m);
        }
        mask
    }

    /// Pixel-space coordinates `(column, row)` with the origin at the
    /// top-left. Coordinates are continuous: pixel centres land on integers.
    pub fn to_pixels(&self, points: &[Point2<f64>]) -> Vec<Point2<f64>> {
        let axis = |centers: &[f64], v: f64| {
            let n = centers.len();
            if n < 2 {
                return 0.0;
            }
            let span = centers[n - 1] - centers[0];
            if span == 0.0 {
                0.0
            } else {
                (v - centers[0]) / span * (n - 1) as f64
            }
        };
        points
            .iter()
            .map(|p| Point2::new(axis(&self.xs, p.x), axis(&self.ys, p.y)))
            .collect()
    }
}
