//! Bootstrap-averaged 2D densities on the shared grid.

use crate::grid::Grid;
use crate::projection::project;
use mpase_core::{density_from_vec, CfgHdr, DensityMap, Error, Plane, Result};
use mpase_imgproc::{bin_indices_2d, gaussian_filter, histogram_from_bins};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::debug;

/// Points drawn (with replacement) per bootstrap round.
pub fn resample_size(n: usize, sample_frac: f64) -> usize {
    ((sample_frac * n as f64).round() as usize).max(1)
}

struct PlaneAccumulator {
    plane: Plane,
    nx: u32,
    ny: u32,
    bins: Vec<Option<u32>>,
    sum: Vec<f64>,
}

/// Average of `n_boot` smoothed histograms, one field per requested plane.
///
/// Every round draws one resample that feeds all planes, so the planes of a
/// label stay consistent. The generator is seeded with `seed` alone.
pub fn boot_density_2d(
    points: &[Point3<f64>],
    grid: &Grid,
    planes: &[Plane],
    cfg: &CfgHdr,
    seed: u64,
) -> Result<BTreeMap<Plane, DensityMap>> {
    if points.is_empty() {
        return Err(Error::invalid_input("bootstrap density needs at least one point"));
    }
    if cfg.n_boot == 0 {
        return Err(Error::config("n_boot must be at least 1"));
    }

    let mut accs = Vec::with_capacity(planes.len());
    for &plane in planes {
        let (ex, ey) = grid.plane_edges(plane);
        let (nx, ny) = grid.plane_size(plane);
        let bins = bin_indices_2d(&project(points, plane), ex, ey)?;
        accs.push(PlaneAccumulator {
            plane,
            nx,
            ny,
            bins,
            sum: vec![0.0; nx as usize * ny as usize],
        });
    }

    let n = points.len();
    let k = resample_size(n, cfg.sample_frac);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sample = vec![0usize; k];

    for _ in 0..cfg.n_boot {
        for s in sample.iter_mut() {
            *s = rng.gen_range(0..n);
        }
        for acc in accs.iter_mut() {
            let hist = histogram_from_bins(&acc.bins, &sample, acc.nx, acc.ny);
            let smooth = gaussian_filter(&hist, cfg.sigma_px);
            for (a, &v) in acc.sum.iter_mut().zip(smooth.as_raw()) {
                *a += f64::from(v);
            }
        }
    }

    let inv = 1.0 / cfg.n_boot as f64;
    let mut out = BTreeMap::new();
    for acc in accs {
        let data: Vec<f32> = acc.sum.iter().map(|&v| (v * inv) as f32).collect();
        let field = density_from_vec(acc.nx, acc.ny, data)
            .ok_or_else(|| Error::invalid_input("density buffer size mismatch"))?;
        out.insert(acc.plane, field);
    }
    debug!(n, k, n_boot = cfg.n_boot, planes = out.len(), "bootstrap density done");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian_cloud(n: usize, seed: u64) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut normal = move || {
            let u1: f64 = rng.gen_range(1e-12..1.0);
            let u2: f64 = rng.gen();
            (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
        };
        (0..n)
            .map(|_| Point3::new(normal(), 0.5 * normal(), 0.25 * normal()))
            .collect()
    }

    fn cfg(n_boot: usize) -> CfgHdr {
        CfgHdr {
            n_boot,
            ..CfgHdr::default()
        }
    }

    #[test]
    fn identical_seed_reproduces_fields() {
        let pts = gaussian_cloud(400, 1);
        let grid = Grid::from_points(&pts, 64, 0.05).unwrap();
        let a = boot_density_2d(&pts, &grid, &Plane::ALL, &cfg(8), 7).unwrap();
        let b = boot_density_2d(&pts, &grid, &Plane::ALL, &cfg(8), 7).unwrap();
        assert_eq!(a, b);
        let c = boot_density_2d(&pts, &grid, &Plane::ALL, &cfg(8), 8).unwrap();
        assert_ne!(a[&Plane::XY], c[&Plane::XY]);
    }

    #[test]
    fn mass_matches_resample_size() {
        let pts = gaussian_cloud(300, 2);
        let grid = Grid::from_points(&pts, 48, 0.2).unwrap();
        let hdr = CfgHdr {
            n_boot: 4,
            sample_frac: 0.5,
            ..CfgHdr::default()
        };
        let fields = boot_density_2d(&pts, &grid, &[Plane::XZ], &hdr, 0).unwrap();
        assert_eq!(fields.len(), 1);
        let f = &fields[&Plane::XZ];
        assert_eq!(f.dimensions(), grid.plane_size(Plane::XZ));
        let total: f64 = f.as_raw().iter().map(|&v| f64::from(v)).sum();
        // Reflective borders keep the blurred mass; padding keeps points inside.
        assert!((total - 150.0).abs() < 1e-2, "total {total}");
    }

    #[test]
    fn rejects_empty_input() {
        let pts = gaussian_cloud(10, 3);
        let grid = Grid::from_points(&pts, 32, 0.05).unwrap();
        assert!(boot_density_2d(&[], &grid, &Plane::ALL, &cfg(2), 0).is_err());
        assert_eq!(resample_size(10, 0.01), 1);
        assert_eq!(resample_size(10, 1.0), 10);
    }
}
