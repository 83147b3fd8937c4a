#![allow(dead_code)]

use mpase::{PointSet, RunConfig};
use nalgebra::{Point3, Rotation3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

fn normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Axis-aligned anisotropic Gaussian cloud centered at the origin.
pub fn gaussian_cloud(n: usize, sigma: [f64; 3], seed: u64) -> Vec<Point3<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Point3::new(
                sigma[0] * normal(&mut rng),
                sigma[1] * normal(&mut rng),
                sigma[2] * normal(&mut rng),
            )
        })
        .collect()
}

/// Thin annulus of radius `r` in the XY plane.
pub fn ring(n: usize, r: f64, seed: u64) -> Vec<Point3<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let t = rng.gen_range(0.0..TAU);
            let rr = r + 0.05 * normal(&mut rng);
            Point3::new(rr * t.cos(), rr * t.sin(), 0.1 * normal(&mut rng))
        })
        .collect()
}

/// `points` rotated and then shifted.
pub fn rigidly_moved(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let rot = Rotation3::from_euler_angles(0.7, -0.4, 1.1);
    let shift = Vector3::new(5.0, -2.0, 12.0);
    points.iter().map(|p| rot * p + shift).collect()
}

/// A rotated, translated copy next to the original.
pub fn twin_sets() -> Vec<PointSet> {
    let a = gaussian_cloud(400, [3.0, 1.5, 0.6], 7);
    let b = rigidly_moved(&a);
    vec![PointSet::new("a", a), PointSet::new("b", b)]
}

/// Small grid, few bootstraps and three levels so runs stay quick.
pub fn small_config() -> RunConfig {
    let mut cfg = RunConfig::fast();
    cfg.common.grid_base = 64;
    cfg.hdr.n_boot = 8;
    cfg.hdr.mass_levels = vec![1.0, 0.9, 0.5];
    cfg.pf.frac_levels = vec![1.0, 0.9, 0.5];
    cfg
}

pub fn write_csv(path: &std::path::Path, points: &[Point3<f64>]) {
    let mut s = String::from("id,middle_x,middle_y,middle_z\n");
    for (i, p) in points.iter().enumerate() {
        s.push_str(&format!("{i},{},{},{}\n", p.x, p.y, p.z));
    }
    std::fs::write(path, s).unwrap();
}
