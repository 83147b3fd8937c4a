//! Shared voxel grid every plane and label is rasterised on.

use mpase_core::{bounds, Error, Plane, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

pub const MIN_BINS: usize = 32;
pub const MAX_BINS: usize = 512;

/// Bin edges per spatial axis. Built once per run and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    edges: [Vec<f64>; 3],
}

fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            v[n - 1] = stop;
            v
        }
    }
}

impl Grid {
    /// Union bounding box padded by `pad_frac` of its largest extent, with the
    /// longest axis spanning about `grid_base` bins (clamped to 32..=512).
    pub fn from_points(points: &[Point3<f64>], grid_base: usize, pad_frac: f64) -> Result<Self> {
        if points.iter().any(|p| !p.coords.iter().all(|v| v.is_finite())) {
            return Err(Error::invalid_input("grid points must be finite"));
        }
        let (mut mn, mut mx) = bounds(points)
            .ok_or_else(|| Error::invalid_input("cannot build a grid from no points"))?;
        let ext = mx - mn;
        let pad = pad_frac * ext.max();
        for k in 0..3 {
            mn[k] -= pad;
            mx[k] += pad;
        }
        let ext = mx - mn;
        let scale = grid_base as f64 / (ext.max() + 1e-8);

        let edges = [0, 1, 2].map(|k| {
            let bins = ((ext[k] * scale).ceil() as usize).clamp(MIN_BINS, MAX_BINS);
            linspace(mn[k], mx[k], bins + 1)
        });
        Ok(Self { edges })
    }

    pub fn edges(&self, axis: usize) -> &[f64] {
        &self.edges[axis]
    }

    /// Bin counts per axis.
    pub fn dims(&self) -> [usize; 3] {
        [0, 1, 2].map(|k| self.edges[k].len() - 1)
    }

    /// Horizontal and vertical edges of a plane.
    pub fn plane_edges(&self, plane: Plane) -> (&[f64], &[f64]) {
        let (i, j) = plane.axes();
        (&self.edges[i], &self.edges[j])
    }

    /// `(nx, ny)` pixels of a plane.
    pub fn plane_size(&self, plane: Plane) -> (u32, u32) {
        let (i, j) = plane.axes();
        let d = self.dims();
        (d[i] as u32, d[j] as u32)
    }

    /// Pixel centre coordinates used for rasterisation: `nx` (resp. `ny`)
    /// values spread evenly from the first to the last edge.
    pub fn pixel_centers(&self, plane: Plane) -> (Vec<f64>, Vec<f64>) {
        let (ex, ey) = self.plane_edges(plane);
        (
            linspace(ex[0], ex[ex.len() - 1], ex.len() - 1),
            linspace(ey[0], ey[ey.len() - 1], ey.len() - 1),
        )
    }
}
