//! High-density-region shapes: density-mass thresholding.

use crate::shape::ShapeProduct;
use mpase_core::{level_percent, mask_at_least, DensityMap, Plane, Variant};
use mpase_imgproc::{find_contours, longest_contour, Contour};

/// Coverage at or above which every positive pixel is included.
pub const FULL_MASS: f64 = 0.999_999;

/// Zero the values below `frac` times the field maximum.
pub fn apply_density_floor(field: &DensityMap, frac: f64) -> DensityMap {
    let mut out = field.clone();
    if frac <= 0.0 {
        return out;
    }
    let max = field.as_raw().iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let max = if max.is_finite() { f64::from(max) } else { 0.0 };
    let eps = frac * max;
    if eps <= 0.0 {
        return out;
    }
    let data: &mut [f32] = &mut out;
    for v in data.iter_mut() {
        if f64::from(*v) < eps {
            *v = 0.0;
        }
    }
    out
}

/// Threshold `τ` such that the values `>= τ` hold about `mass` of the total.
///
/// Non-positive totals (and fields without a positive value) give
/// `f32::INFINITY`, which selects nothing.
pub fn mass_threshold(field: &DensityMap, mass: f64) -> f32 {
    let total: f64 = field.as_raw().iter().map(|&v| f64::from(v)).sum();
    if !(total > 0.0) {
        return f32::INFINITY;
    }
    if mass >= FULL_MASS {
        return field
            .as_raw()
            .iter()
            .copied()
            .filter(|&v| v > 0.0)
            .fold(f32::INFINITY, f32::min);
    }

    let mut sorted = field.as_raw().clone();
    sorted.sort_unstable_by(|a, b| b.total_cmp(a));
    let mut cumsum = Vec::with_capacity(sorted.len());
    let mut acc = 0.0f64;
    for &v in &sorted {
        acc += f64::from(v);
        cumsum.push(acc);
    }
    let target = mass * acc;
    let idx = cumsum.partition_point(|&c| c < target).min(sorted.len() - 1);
    sorted[idx]
}

/// Longest iso-line of `field` at `tau`, `None` for an unreachable threshold.
pub fn contour_at_threshold(field: &DensityMap, tau: f32) -> Option<Contour> {
    if !tau.is_finite() {
        return None;
    }
    longest_contour(find_contours(field, tau))
}

/// HDR shape of one density field at coverage `mass`.
pub fn make_hdr_shape(
    field: &DensityMap,
    plane: Plane,
    mass: f64,
    density_floor_frac: f64,
) -> ShapeProduct {
    let floored = apply_density_floor(field, density_floor_frac);
    let tau = mass_threshold(&floored, mass);
    ShapeProduct {
        plane,
        level: level_percent(mass),
        variant: Variant::Hdr,
        mask: mask_at_least(&floored, tau),
        contour: contour_at_threshold(&floored, tau),
    }
}
