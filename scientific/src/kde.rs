//! Gaussian kernel density scores for 2D point sets.

use crate::geometry::build_tree;
use mpase_core::stats::median;
use mpase_core::BandwidthStrategy;
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::prelude::*;
use rstar::PointDistance;
use std::f64::consts::PI;

/// Points used for the pairwise-distance bandwidth heuristic.
pub const BANDWIDTH_SUBSAMPLE: usize = 500;

pub const MIN_BANDWIDTH: f64 = 1e-6;

/// Largest `d² / 2h²` whose kernel term is still representable; `exp` of
/// anything below `-745` is zero in f64.
const KERNEL_CUTOFF: f64 = 745.0;

/// Log of the Gaussian kernel density estimate evaluated at every input point.
///
/// `score_i = log Σ_j exp(-|p_i - p_j|² / 2h²) - log N - log(2πh²)`.
/// Only neighbours inside the radius where the kernel underflows are
/// visited, so the sum equals the all-pairs one. Fewer than two points
/// score zero.
pub fn kde_log_scores(points: &[Point2<f64>], bandwidth: f64) -> Vec<f64> {
    let n = points.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let inv_two_h2 = 1.0 / (2.0 * bandwidth * bandwidth);
    let norm = (n as f64).ln() + (2.0 * PI * bandwidth * bandwidth).ln();
    let radius_2 = KERNEL_CUTOFF / inv_two_h2;
    let tree = build_tree(points);

    points
        .par_iter()
        .map(|p| {
            let q = [p.x, p.y];
            // The self term is the largest, exp(0) = 1, so no rescaling.
            let sum: f64 = tree
                .locate_within_distance(q, radius_2)
                .map(|w| (-w.distance_2(&q) * inv_two_h2).exp())
                .sum();
            sum.ln() - norm
        })
        .collect()
}

fn scott_bandwidth(points: &[Point2<f64>]) -> f64 {
    let n = points.len().max(2) as f64;
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    let spread = crate::mean(&[
        crate::std(&xs).unwrap_or(0.0),
        crate::std(&ys).unwrap_or(0.0),
    ])
    .unwrap_or(0.0);
    let spread = if spread > 0.0 { spread } else { 1.0 };
    (spread * n.powf(-1.0 / 6.0)).max(MIN_BANDWIDTH)
}

fn median_half_bandwidth(points: &[Point2<f64>], seed: u64) -> f64 {
    let sample: Vec<Point2<f64>> = if points.len() > BANDWIDTH_SUBSAMPLE {
        let mut rng = StdRng::seed_from_u64(seed);
        index::sample(&mut rng, points.len(), BANDWIDTH_SUBSAMPLE)
            .into_iter()
            .map(|i| points[i])
            .collect()
    } else {
        points.to_vec()
    };

    let mut dists = Vec::with_capacity(sample.len() * (sample.len() - 1) / 2);
    for (i, p) in sample.iter().enumerate() {
        for q in &sample[i + 1..] {
            dists.push((p - q).norm());
        }
    }
    (median(&dists) * 0.5).max(MIN_BANDWIDTH)
}

/// Data-driven KDE bandwidth; a single point (or none) gets 1.0.
pub fn auto_bandwidth(points: &[Point2<f64>], strategy: BandwidthStrategy, seed: u64) -> f64 {
    if points.len() <= 1 {
        return 1.0;
    }
    match strategy {
        BandwidthStrategy::MedianHalf => median_half_bandwidth(points, seed),
        BandwidthStrategy::Scott => scott_bandwidth(points),
    }
}
