//! Point-fraction shapes: keep the densest points, splat, clean up.

use crate::shape::ShapeProduct;
use mpase_core::{level_percent, CfgMorph, CfgPf, Mask, Plane, Variant};
use mpase_imgproc::{
    binary_close, binary_open, contour_from_mask, cross_kernel, fill_holes, largest_component,
    rasterize_points,
};
use mpase_scientific::{auto_bandwidth, kde_log_scores};
use nalgebra::Point2;

/// Points kept at fraction `frac`: `ceil(frac * n)`, at least one.
pub fn keep_count(n: usize, frac: f64) -> usize {
    ((frac * n as f64).ceil() as usize).clamp(1, n.max(1))
}

/// Indices of the `k` highest scores, highest first. Equal scores keep
/// their input order.
pub fn select_top_fraction(scores: &[f64], frac: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(keep_count(scores.len(), frac));
    order
}

/// Closing, opening, then largest component (optionally hole-filled), or
/// plain hole filling when the largest-component step is off.
pub fn clean_mask(mask: &Mask, morph: &CfgMorph) -> Mask {
    let kernel = cross_kernel();
    let mut out = mask.clone();
    if morph.closing > 0 {
        out = binary_close(&out, &kernel, morph.closing);
    }
    if morph.opening > 0 {
        out = binary_open(&out, &kernel, morph.opening);
    }
    if morph.keep_largest {
        largest_component(&out, morph.fill_holes)
    } else if morph.fill_holes {
        fill_holes(&out)
    } else {
        out
    }
}

fn bandwidth_for(points: &[Point2<f64>], cfg: &CfgPf) -> f64 {
    cfg.bandwidth
        .unwrap_or_else(|| auto_bandwidth(points, cfg.bandwidth_strategy, cfg.bandwidth_seed))
}

fn mask_of_kept(kept: &[Point2<f64>], xs: &[f64], ys: &[f64], cfg: &CfgPf) -> Mask {
    clean_mask(&rasterize_points(kept, xs, ys, cfg.disk_px), &cfg.morph)
}

/// Cleaned mask of the densest `frac` of `points`, the kept points and the
/// KDE bandwidth used.
pub fn point_fraction_mask(
    points: &[Point2<f64>],
    xs: &[f64],
    ys: &[f64],
    frac: f64,
    cfg: &CfgPf,
) -> (Mask, Vec<Point2<f64>>, f64) {
    let bandwidth = bandwidth_for(points, cfg);
    let scores = kde_log_scores(points, bandwidth);
    let kept: Vec<Point2<f64>> = if points.is_empty() {
        Vec::new()
    } else {
        select_top_fraction(&scores, frac)
            .into_iter()
            .map(|i| points[i])
            .collect()
    };
    (mask_of_kept(&kept, xs, ys, cfg), kept, bandwidth)
}

fn shape_from_mask(mask: Mask, plane: Plane, frac: f64) -> ShapeProduct {
    let contour = contour_from_mask(&mask);
    ShapeProduct {
        plane,
        level: level_percent(frac),
        variant: Variant::PointFraction,
        mask,
        contour,
    }
}

pub fn make_pf_shape(
    points: &[Point2<f64>],
    xs: &[f64],
    ys: &[f64],
    plane: Plane,
    frac: f64,
    cfg: &CfgPf,
) -> ShapeProduct {
    let (mask, _, _) = point_fraction_mask(points, xs, ys, frac, cfg);
    shape_from_mask(mask, plane, frac)
}

/// Shapes for several fractions of one point set. Scores are computed once
/// and every level keeps a prefix of the same ranking.
pub fn make_pf_shapes(
    points: &[Point2<f64>],
    xs: &[f64],
    ys: &[f64],
    plane: Plane,
    fracs: &[f64],
    cfg: &CfgPf,
) -> Vec<ShapeProduct> {
    let scores = kde_log_scores(points, bandwidth_for(points, cfg));
    let ranked: Vec<Point2<f64>> = select_top_fraction(&scores, 1.0)
        .into_iter()
        .map(|i| points[i])
        .collect();
    fracs
        .iter()
        .map(|&frac| {
            let k = if points.is_empty() { 0 } else { keep_count(points.len(), frac) };
            shape_from_mask(mask_of_kept(&ranked[..k], xs, ys, cfg), plane, frac)
        })
        .collect()
}
